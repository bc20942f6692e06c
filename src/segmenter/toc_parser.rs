use regex::{Captures, Regex};

use super::TocEntry;

/// 目录层级的上限，超出的条目被过滤掉
const MAX_LEVEL: u8 = 3;

/// 两行合并的单槽缓冲状态机
///
/// `Pending` 保存一个匹配了前缀语法但没有尾部页码的行，
/// 等待下一个不匹配语法的行与之拼接后整体重新解析
#[derive(Debug, Clone, PartialEq)]
enum MergeState {
    Idle,
    PendingPrefix(String),
}

/// 单行解析的中间结果：标题、层级和（可能缺失的）页码
#[derive(Debug, Clone)]
struct ParsedLine {
    title: String,
    level: u8,
    page: Option<usize>,
    /// 前缀中的内部点数（决定该行是否可以进入合并缓冲）
    internal_dots: usize,
}

/// 目录行解析器
///
/// 把从目录页采集的原始文本行转换为有序的 `TocEntry` 列表。
/// 识别三类前缀：«Глава N.»、带点数字（"1."、"1.2."、"2.3.4."）、
/// 单字母加点（"A.1."）。支持跨行标题的两行合并和对不规则行的
/// 回退恢复。无法解析的行静默跳过，不中断解析。
pub struct TocLineParser {
    /// 前缀 + 标题正文 + 可选的点引导页码
    heading_re: Regex,
    /// 行尾的裸页码
    simple_page_re: Regex,
    /// 回退恢复：数字加点开头
    digit_start_re: Regex,
    /// 点引导（2 个以上连续的点）
    dot_leader_re: Regex,
    /// 连续空白
    whitespace_re: Regex,
}

impl TocLineParser {
    /// 创建新的目录行解析器实例
    pub fn new() -> Self {
        Self {
            heading_re: Regex::new(
                r"(?i)^\s*(Глава\s+\S+\.|\d+\.\d*\.?|\d+\.\d+\.\d*\.?|[A-Z]\.\d*\.?)\s+(.+?)(?:\s+\.+\s*(\d+))?\s*$",
            )
            .unwrap(),
            simple_page_re: Regex::new(r"(\d+)$").unwrap(),
            digit_start_re: Regex::new(r"^\d+\.?\s").unwrap(),
            dot_leader_re: Regex::new(r"\.{2,}").unwrap(),
            whitespace_re: Regex::new(r"\s+").unwrap(),
        }
    }

    /// 清理一行：点引导折叠为空格，空白折叠为单个空格，去掉首尾空白
    fn clean_line(&self, line: &str) -> String {
        let no_leaders = self.dot_leader_re.replace_all(line, " ");
        self.whitespace_re
            .replace_all(&no_leaders, " ")
            .trim()
            .to_string()
    }

    /// 解析目录行序列
    ///
    /// # 参数
    /// - `lines`: 目录页的原始文本行（按阅读顺序）
    ///
    /// # 返回
    /// 过滤到层级 ∈ [1,3] 且页码 > 0、按页码稳定排序的条目列表。
    /// 多栏目录会打乱线性阅读顺序，按页码重排可以纠正。
    pub fn parse_lines<'a, I>(&self, lines: I) -> Vec<TocEntry>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut entries: Vec<TocEntry> = Vec::new();
        let mut state = MergeState::Idle;

        for line in lines {
            let clean = self.clean_line(line);
            if clean.is_empty() {
                continue;
            }
            // 噪声：孤立的章节标记词
            if clean == "Глава" {
                continue;
            }

            if let Some(caps) = self.heading_re.captures(&clean) {
                let parsed = self.line_from_captures(&caps, &clean);
                if let Some(page) = parsed.page {
                    entries.push(TocEntry {
                        title: parsed.title,
                        level: parsed.level,
                        page_start: page,
                    });
                    // 完整条目出现后，残留的待合并片段已经过期
                    state = MergeState::Idle;
                } else if parsed.internal_dots <= 2 {
                    // 无页码且前缀不深：可能是被换行截断的标题
                    state = MergeState::PendingPrefix(clean);
                } else {
                    state = MergeState::Idle;
                }
                continue;
            }

            // 不匹配语法的行：先尝试与缓冲的前缀片段拼接
            if let MergeState::PendingPrefix(fragment) = std::mem::replace(&mut state, MergeState::Idle) {
                let combined = format!("{} {}", fragment, clean);
                if let Some(caps) = self.heading_re.captures(&combined) {
                    let parsed = self.line_from_captures(&caps, &combined);
                    if let Some(page) = parsed.page {
                        entries.push(TocEntry {
                            title: parsed.title,
                            level: parsed.level,
                            page_start: page,
                        });
                        continue;
                    }
                }
                // 拼接失败：丢弃缓冲，当前行继续走回退恢复
            }

            if let Some(entry) = self.rescue_line(&clean) {
                entries.push(entry);
            }
        }

        entries.retain(|e| (1..=MAX_LEVEL).contains(&e.level) && e.page_start > 0);
        entries.sort_by_key(|e| e.page_start);
        entries
    }

    /// 根据语法捕获组构造中间结果
    ///
    /// «Глава» 前缀 → 层级 1，标题渲染为 "Глава <N> <正文>"；
    /// 数字/字母前缀 → 层级 = 内部点数 + 1，最低 2。
    /// 页码：捕获组里的尾部整数，缺失时扫描整行尾部的裸整数。
    fn line_from_captures(&self, caps: &Captures, clean: &str) -> ParsedLine {
        let prefix = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let body = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        let page_str = caps.get(3).map(|m| m.as_str());

        let (title, level, internal_dots);
        if prefix.to_lowercase().starts_with("глава") {
            let number = prefix.split_whitespace().nth(1).unwrap_or("");
            title = format!("Глава {} {}", number, body).replace("..", ".");
            level = 1;
            internal_dots = 0;
        } else {
            // 内部点：不计前缀末尾的终止点（"1.2." 有 1 个内部点）
            internal_dots = prefix.trim_end_matches('.').matches('.').count();
            level = (internal_dots + 1).max(2) as u8;
            title = format!("{} {}", prefix, body).trim().to_string();
        }

        let page = page_str
            .and_then(|s| s.parse::<usize>().ok())
            .or_else(|| self.trailing_page(clean));

        ParsedLine {
            title,
            level,
            page,
            internal_dots,
        }
    }

    /// 扫描行尾的裸整数页码
    fn trailing_page(&self, text: &str) -> Option<usize> {
        self.simple_page_re
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
    }

    /// 回退恢复：不匹配主语法、但含有 «Глава» 或以数字加点开头、
    /// 且以裸整数结尾的行
    fn rescue_line(&self, clean: &str) -> Option<TocEntry> {
        if !clean.contains("Глава") && !self.digit_start_re.is_match(clean) {
            return None;
        }
        let caps = self.simple_page_re.captures(clean)?;
        let page_match = caps.get(1)?;
        let page = page_match.as_str().parse::<usize>().ok()?;
        let title = clean[..page_match.start()].trim().to_string();
        let level = if title.contains("Глава") { 1 } else { 2 };
        Some(TocEntry {
            title,
            level,
            page_start: page,
        })
    }
}

impl Default for TocLineParser {
    fn default() -> Self {
        Self::new()
    }
}
