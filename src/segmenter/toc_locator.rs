use regex::Regex;

use crate::page_source::PageSource;

/// 目录窗口最多向前读取的页数
const MAX_TOC_PAGES: usize = 25;

/// 目录标记词（小写比较）
const TOC_KEYWORDS: [&str; 4] = ["содержание", "оглавление", "contents", "table of contents"];

/// 正文开始前，书页首行允许检查的行数
const BODY_PROBE_LINES: usize = 5;

/// 目录定位器
///
/// 在页面流中寻找目录窗口：从第一个含目录标记词的页面开始，
/// 连续向前收集页面文本，直到遇到不可提取的页面（扫描页）、
/// 正文第一章的开头，或达到页数上限
pub struct TocLocator {
    /// 正文开始标志：«Глава 1» / "Chapter 1" 打头的行
    body_start_re: Regex,
    /// 连续空白
    whitespace_re: Regex,
}

impl TocLocator {
    /// 创建新的目录定位器实例
    pub fn new() -> Self {
        Self {
            body_start_re: Regex::new(r"(?i)^(Глава\s+1\.?\s|Chapter\s+1\.?\s)").unwrap(),
            whitespace_re: Regex::new(r"\s+").unwrap(),
        }
    }

    /// 定位并收集目录窗口文本
    ///
    /// # 参数
    /// - `source`: 页面源
    ///
    /// # 返回
    /// 目录窗口的拼接文本；未找到标记词时为 None
    pub fn locate(&self, source: &dyn PageSource) -> Option<String> {
        let total = source.page_count();

        // 1. 找到第一个含目录标记词的页面
        let mut toc_start = None;
        for page in 1..=total {
            if let Some(text) = source.page_text(page) {
                let lower = text.to_lowercase();
                if TOC_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                    toc_start = Some(page);
                    break;
                }
            }
        }
        let toc_start = toc_start?;

        // 2. 从该页开始连续收集
        let mut parts = Vec::new();
        let last = (toc_start + MAX_TOC_PAGES - 1).min(total);
        'pages: for page in toc_start..=last {
            let text = match source.page_text(page) {
                Some(t) if !t.trim().is_empty() => t,
                // 空页面多半是扫描页 → 目录到此为止
                _ => break,
            };
            parts.push(text.clone());

            // 该页是否已经开始正文（«Глава 1» 打头）？
            for line in text.lines().take(BODY_PROBE_LINES) {
                let clean = self.whitespace_re.replace_all(line.trim(), " ");
                if self.body_start_re.is_match(&clean) {
                    // 点引导很多的行是目录自身的行，不算正文开头
                    if clean.matches('.').count() >= 4 {
                        continue;
                    }
                    break 'pages;
                }
            }
        }

        Some(parts.join("\n"))
    }
}

impl Default for TocLocator {
    fn default() -> Self {
        Self::new()
    }
}
