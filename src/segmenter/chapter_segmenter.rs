use regex::Regex;

use super::heading_matcher::{is_working_char, normalize, HeadingMatcher};
use super::{ChapterBlock, TocEntry};
use crate::page_source::PageSource;

/// 章节空文本占位符
const EMPTY_CONTENT_PLACEHOLDER: &str = "(Нет текста)";

/// 分界页归属策略
///
/// 同一物理页上既有上一章的结尾又有下一章的开头时，
/// 该页计入哪一章由此策略统一决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryOwnership {
    /// 页面以下一章标题开头 → 整页归下一章，上一章结束于前一页
    ExclusiveToNext,
    /// 页面中途切换 → 分界页同时计入两章的页码范围
    InclusiveToBoth,
}

/// 近似切分点
///
/// 归一化文本中的匹配位置映射回原始文本的字节偏移。
/// 在重度非字母数字噪声下映射是有损的，`exact` 标记恢复是否成功；
/// 失败时偏移落在文本末尾（整页归当前章节）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPoint {
    /// 原始文本中的字节偏移（字符边界上）
    pub byte_index: usize,
    /// 字母数字计数扫描是否到达了匹配位置
    pub exact: bool,
}

/// 章节分割器
///
/// 按物理页顺序遍历页面流，对照目录条目（层级 ≤ 2 才定义章节边界）
/// 把原始文本切分为带页码范围的扁平章节块。容忍扫描页、目录页码
/// 不准和一页多个章节起始
pub struct ChapterSegmenter {
    matcher: HeadingMatcher,
    /// 页面标记：--- Страница N ---
    page_marker_re: Regex,
    /// 点引导
    dot_leader_re: Regex,
    /// 连续空白
    whitespace_re: Regex,
}

impl ChapterSegmenter {
    /// 创建新的章节分割器实例
    pub fn new() -> Self {
        Self {
            matcher: HeadingMatcher::new(),
            page_marker_re: Regex::new(r"--- Страница\s+(\d+)\s+---").unwrap(),
            dot_leader_re: Regex::new(r"\.{2,}").unwrap(),
            whitespace_re: Regex::new(r"\s+").unwrap(),
        }
    }

    /// 清理页面文本：点引导折叠为空格，空白折叠为单个空格
    fn clean_page(&self, raw: &str) -> String {
        let no_leaders = self.dot_leader_re.replace_all(raw, " ");
        self.whitespace_re
            .replace_all(&no_leaders, " ")
            .trim()
            .to_string()
    }

    /// 在原始文本中定位标题的近似起始偏移
    ///
    /// 先在归一化文本中做子串搜索，再逐字符扫描原始文本、
    /// 只统计工作字母表字符，把归一化位置映射回原始偏移，
    /// 从而保留切分片段中的原始标点和空白。
    ///
    /// # 返回
    /// 归一化搜索落空时为 None（模糊层命中但精确子串不存在）
    fn locate_heading_split(&self, raw: &str, heading: &str) -> Option<SplitPoint> {
        let clean_heading = self.matcher.strip_trailing_page_number(heading);
        let norm_h = normalize(clean_heading);
        let norm_p = normalize(raw);
        if norm_h.is_empty() {
            return None;
        }

        let byte_pos = norm_p.find(&norm_h)?;
        // 归一化文本中的字符位置
        let char_pos = norm_p[..byte_pos].chars().count();

        let mut seen = 0usize;
        for (idx, ch) in raw.char_indices() {
            if is_working_char(ch) {
                seen += 1;
                if seen > char_pos {
                    return Some(SplitPoint {
                        byte_index: idx,
                        exact: true,
                    });
                }
            }
        }
        // 扫描越过了文本末尾：映射失败，整页留给当前章节
        Some(SplitPoint {
            byte_index: raw.len(),
            exact: false,
        })
    }

    /// 判定分界页的归属
    fn boundary_ownership(&self, page_text: &str, next_heading: &str) -> BoundaryOwnership {
        if self.matcher.page_starts_with_heading(page_text, next_heading) {
            BoundaryOwnership::ExclusiveToNext
        } else {
            BoundaryOwnership::InclusiveToBoth
        }
    }

    /// 关闭当前章节，生成章节块
    fn close_block(
        &self,
        title: &str,
        content_lines: &[String],
        start_page: usize,
        end_page: usize,
    ) -> ChapterBlock {
        let content = if content_lines.is_empty() {
            EMPTY_CONTENT_PLACEHOLDER.to_string()
        } else {
            content_lines.join("\n")
        };
        ChapterBlock {
            title: title.to_string(),
            content,
            start_page,
            end_page,
        }
    }

    /// 遍历页面流，切分出扁平章节块
    ///
    /// # 参数
    /// - `source`: 页面源
    /// - `entries`: 已按页码排序的目录条目
    ///
    /// # 返回
    /// 按出现顺序排列的章节块；目录条目里没有层级 ≤ 2 的标题时为空
    pub fn segment(&self, source: &dyn PageSource, entries: &[TocEntry]) -> Vec<ChapterBlock> {
        let headings: Vec<&TocEntry> = entries.iter().filter(|e| e.level <= 2).collect();
        if headings.is_empty() {
            return Vec::new();
        }

        let total = source.page_count();

        // 起始页：第一个条目的目录页码；退化为第 1 页时用第二个条目的
        let mut walk_from = entries[0].page_start;
        if walk_from <= 1 {
            walk_from = entries.get(1).map(|e| e.page_start).unwrap_or(1);
        }

        let mut blocks: Vec<ChapterBlock> = Vec::new();
        let mut current_idx = 0usize;
        let mut open_content: Vec<String> = Vec::new();
        let mut open_start_page = 0usize;

        for page in walk_from..=total {
            // 扫描页：既不开启也不关闭章节
            let raw = match source.page_text(page) {
                Some(t) if !t.trim().is_empty() => t,
                _ => continue,
            };
            let text = self.clean_page(&raw);
            if current_idx >= headings.len() {
                break;
            }

            // 当前章节尚未确认起始页：在本页确认标题后记录
            if open_content.is_empty()
                && self
                    .matcher
                    .heading_appears_on_page(&text, &headings[current_idx].title)
            {
                open_start_page = page;
            }

            // 下一章的标题出现在本页 → 切分
            let next_on_page = headings
                .get(current_idx + 1)
                .map(|h| self.matcher.heading_appears_on_page(&text, &h.title))
                .unwrap_or(false);

            if !next_on_page {
                // 整页归当前章节
                open_content.push(format!("--- Страница {} ---", page));
                open_content.push(text);
                continue;
            }

            let next_heading = &headings[current_idx + 1].title;
            let split = self
                .locate_heading_split(&text, next_heading)
                .unwrap_or(SplitPoint {
                    byte_index: text.len(),
                    exact: false,
                });

            let part_current = text[..split.byte_index].trim();
            let part_next = text[split.byte_index..].trim().to_string();

            if !part_current.is_empty() {
                open_content.push(format!("--- Страница {} ---", page));
                open_content.push(part_current.to_string());
            }

            // 分界页归属：本页自身以下一章标题开头 → 不计入上一章
            let end_page = match self.boundary_ownership(&text, next_heading) {
                BoundaryOwnership::ExclusiveToNext => page.saturating_sub(1),
                BoundaryOwnership::InclusiveToBoth => page,
            };
            blocks.push(self.close_block(
                &headings[current_idx].title,
                &open_content,
                open_start_page,
                end_page,
            ));

            current_idx += 1;
            open_content.clear();
            open_start_page = page;

            // 同一物理页上可能还有更多章节的起始：对剩余文本循环判定
            let mut remaining = part_next;
            while current_idx + 1 < headings.len() && !remaining.is_empty() {
                let further = &headings[current_idx + 1].title;
                if !self.matcher.heading_appears_on_page(&remaining, further) {
                    break;
                }
                let Some(split) = self.locate_heading_split(&remaining, further) else {
                    break;
                };
                let cur_part = remaining[..split.byte_index].trim();
                if !cur_part.is_empty() {
                    blocks.push(ChapterBlock {
                        title: headings[current_idx].title.clone(),
                        content: format!("--- Страница {} --- (продолжение)\n{}", page, cur_part),
                        start_page: page,
                        end_page: page,
                    });
                }
                current_idx += 1;
                remaining = remaining[split.byte_index..].trim().to_string();
            }

            // 最后开启的章节接收本页剩余文本
            if !remaining.is_empty() && current_idx < headings.len() {
                open_content.push(format!("--- Страница {} --- (продолжение)", page));
                open_content.push(remaining);
            }
        }

        // 最后一章结束于书的最后一页
        if current_idx < headings.len() && !open_content.is_empty() {
            blocks.push(self.close_block(
                &headings[current_idx].title,
                &open_content,
                open_start_page,
                total,
            ));
        }

        // 起始页修正：以内容中第一个页面标记为准
        // （补偿真正起始页之前被跳过的无文本页）
        for block in &mut blocks {
            self.correct_start_page(block);
        }

        blocks
    }

    /// 从拼装好的内容中读出第一个页面标记，修正起始页
    fn correct_start_page(&self, block: &mut ChapterBlock) {
        if let Some(caps) = self.page_marker_re.captures(&block.content) {
            if let Ok(detected) = caps[1].parse::<usize>() {
                if detected != block.start_page {
                    block.start_page = detected;
                }
            }
        }
    }
}

impl Default for ChapterSegmenter {
    fn default() -> Self {
        Self::new()
    }
}
