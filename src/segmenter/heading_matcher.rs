use regex::Regex;
use std::collections::HashSet;

/// 精确前缀匹配使用的归一化字符数
const EXACT_PREFIX_LEN: usize = 20;
/// 模糊匹配的接受阈值（二元组 Jaccard 相似度）
const FUZZY_THRESHOLD: f64 = 0.95;

/// 判断字符是否属于工作字母表（俄文字母、拉丁字母、数字）
///
/// 归一化和近似偏移恢复都只统计这些字符
pub fn is_working_char(c: char) -> bool {
    matches!(c,
        'a'..='z' | 'A'..='Z' | '0'..='9'
        | 'а'..='я' | 'А'..='Я' | 'ё' | 'Ё')
}

/// 激进归一化：只保留工作字母表字符，ё → е，转小写
///
/// 对标题和页面文本使用完全相同的归一化，保证比较的对称性。
/// 幂等：normalize(normalize(x)) == normalize(x)
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| is_working_char(*c))
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            other => other,
        })
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// 构建字符串的二元组集合
///
/// 按字符（而非字节）切分；长度不足 2 时以整个字符串作为唯一元素
fn bigrams(s: &str) -> HashSet<String> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 2 {
        let mut set = HashSet::new();
        set.insert(s.to_string());
        return set;
    }
    chars.windows(2).map(|w| w.iter().collect()).collect()
}

/// 计算两个字符串的二元组 Jaccard 相似度
///
/// 约定：两个空串相似度为 1.0，一空一非空为 0.0
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let set_a = bigrams(a);
    let set_b = bigrams(b);
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// 标题匹配器
///
/// 无状态谓词：判断候选标题是否出现在页面文本中，容忍
/// OCR 噪声、断词和多余的空白/标点。三层短路匹配：
/// 1. 归一化后的精确子串
/// 2. 归一化前缀（前 20 个字符）子串
/// 3. 滑动窗口二元组 Jaccard 模糊匹配
pub struct HeadingMatcher {
    /// 尾部页码模式：（空白/点/破折号）+ 数字 + 行尾
    trailing_page_re: Regex,
}

impl HeadingMatcher {
    /// 创建新的标题匹配器实例
    pub fn new() -> Self {
        Self {
            trailing_page_re: Regex::new(r"\s*[\.\-—]*\s*(\d+)\s*$").unwrap(),
        }
    }

    /// 删除字符串尾部的页码
    ///
    /// 仅当尾部数字与标题正文之间由空白/点/破折号分隔，
    /// 且数字前一个字符不是字母或数字时才删除。
    ///
    /// # 示例
    /// - "SciPy ............ 28" → "SciPy"
    /// - "1.1 Эволюционные алгоритмы 22" → "1.1 Эволюционные алгоритмы"
    /// - "NEAT28" → "NEAT28"（数字紧贴字母，视为单词的一部分）
    pub fn strip_trailing_page_number<'a>(&self, text: &'a str) -> &'a str {
        if let Some(caps) = self.trailing_page_re.captures(text) {
            let whole = caps.get(0).unwrap();
            let digits = caps.get(1).unwrap();
            // 数字前必须不是字母/数字，否则它是单词的一部分
            let glued = text[..digits.start()]
                .chars()
                .next_back()
                .map(|c| c.is_alphanumeric())
                .unwrap_or(false);
            if !glued {
                return text[..whole.start()].trim_end();
            }
        }
        text
    }

    /// 判断页面文本是否以指定标题开头（用于分界页归属判定）
    pub fn page_starts_with_heading(&self, page_text: &str, heading: &str) -> bool {
        let clean_heading = self.strip_trailing_page_number(heading);
        let norm_h = normalize(clean_heading);
        let norm_p = normalize(page_text);
        if norm_h.is_empty() {
            return false;
        }
        norm_p.starts_with(&norm_h)
    }

    /// 判断标题是否出现在页面文本中
    ///
    /// # 参数
    /// - `page_text`: 原始页面文本
    /// - `heading`: 候选标题（可带尾部页码，匹配前会剥离）
    ///
    /// # 返回
    /// 任一匹配层命中则为 true；任一操作数归一化后为空则为 false
    pub fn heading_appears_on_page(&self, page_text: &str, heading: &str) -> bool {
        if heading.is_empty() || page_text.is_empty() {
            return false;
        }

        let clean_heading = self.strip_trailing_page_number(heading);
        let norm_h = normalize(clean_heading);
        let norm_p = normalize(page_text);

        if norm_h.is_empty() || norm_p.is_empty() {
            return false;
        }

        // 1. 精确子串
        if norm_p.contains(&norm_h) {
            return true;
        }

        // 2. 前缀子串（标题通常足够长且唯一）
        let h_chars: Vec<char> = norm_h.chars().collect();
        let prefix_len = EXACT_PREFIX_LEN.min(h_chars.len());
        let prefix: String = h_chars[..prefix_len].iter().collect();
        if norm_p.contains(&prefix) {
            return true;
        }

        // 3. 模糊匹配：以标题长度为窗口在页面上滑动
        let p_chars: Vec<char> = norm_p.chars().collect();
        let window_len = h_chars.len();
        if p_chars.len() < window_len {
            return false;
        }
        for start in 0..=(p_chars.len() - window_len) {
            let window: String = p_chars[start..start + window_len].iter().collect();
            if jaccard_similarity(&norm_h, &window) >= FUZZY_THRESHOLD {
                return true;
            }
        }

        false
    }
}

impl Default for HeadingMatcher {
    fn default() -> Self {
        Self::new()
    }
}
