use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::page_source::PageSource;

// 子模块声明
pub mod chapter_segmenter;
pub mod heading_matcher;
pub mod toc_locator;
pub mod toc_parser;
pub mod tree_builder;

/// 目录条目
///
/// 由目录行解析产生；分割器和树构建器只读消费，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// 条目标题（可能带有尾部页码，匹配时剥离）
    pub title: String,
    /// 层级，取值范围 [1, 3]
    pub level: u8,
    /// 目录中标注的起始页（1 起）
    pub page_start: usize,
}

/// 扁平章节块（瞬态）
///
/// 页面遍历过程中增量构建，章节边界关闭时定稿，
/// 被树构建器消费一次后丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterBlock {
    /// 章节标题（与产生它的目录条目一致）
    pub title: String,
    /// 拼装好的章节文本，按页片段以 `--- Страница N ---` 标记分隔
    pub content: String,
    /// 实际检测到的起始物理页
    pub start_page: usize,
    /// 结束物理页
    pub end_page: usize,
}

/// 叶子节点的页码范围（调试信息，序列化为 "debug" 字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start_page: usize,
    pub end_page: usize,
}

/// 章节树节点
///
/// 两个变体在构建时就确定，序列化形状：
/// - `Interior` → `{ "name": ..., "chapters": [...] }`
/// - `Leaf` → `{ "name": ..., "content": ..., "debug": {...} }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChapterNode {
    /// 有子章节的内部节点
    Interior {
        name: String,
        chapters: Vec<ChapterNode>,
    },
    /// 持有实际文本和页码范围的叶子节点
    Leaf {
        name: String,
        content: String,
        debug: PageRange,
    },
}

/// 分割结果：一本书的标题和章节森林
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub chapters: Vec<ChapterNode>,
}

/// 分割错误
///
/// 只有整本书不可恢复的状态才会成为错误；标题未匹配、
/// 目录行格式错误等局部问题在检测点就地恢复，从不上抛
#[derive(Error, Debug)]
pub enum SegmentError {
    /// 页面扫描范围内未找到目录标记词
    #[error("未找到目录")]
    TocNotFound,
    /// 找到了目录文本，但语法和回退恢复都没有解析出条目
    #[error("未能从目录中解析出任何条目")]
    NoEntriesParsed,
    /// 页面源读取失败（PDF 边界）
    #[error("页面源读取失败: {0}")]
    PageSource(String),
}

/// 分割一本书
///
/// 完整流水线：定位目录窗口 → 解析目录行 → 遍历页面切分章节 →
/// 折叠为层级树。单线程、同步，数据严格单向流动。
///
/// # 参数
/// - `source`: 页面源（按 1 起页码提供文本）
/// - `title`: 书名（写入结果）
///
/// # 返回
/// 分割结果；目录缺失或无法解析时返回错误，调用方可跳过该书继续批处理
pub fn segment_book(source: &dyn PageSource, title: &str) -> Result<Book, SegmentError> {
    let locator = toc_locator::TocLocator::new();
    let toc_text = locator.locate(source).ok_or(SegmentError::TocNotFound)?;

    let parser = toc_parser::TocLineParser::new();
    let entries = parser.parse_lines(toc_text.lines());
    if entries.is_empty() {
        return Err(SegmentError::NoEntriesParsed);
    }

    let segmenter = chapter_segmenter::ChapterSegmenter::new();
    let blocks = segmenter.segment(source, &entries);

    let chapters = tree_builder::build_tree(&entries, &blocks);

    Ok(Book {
        title: title.to_string(),
        chapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_source::MemoryPageSource;

    /// 组装一本 60 页的测试书：目录在第 2 页，两章分别从第 5 和第 40 页开始
    fn two_chapter_book() -> MemoryPageSource {
        let mut pages: Vec<Option<String>> = vec![None; 60];
        pages[0] = Some("Обложка книги".to_string());
        pages[1] = Some(
            "Содержание\nГлава 1. Введение ........ 5\nГлава 2. Основы ........ 40".to_string(),
        );
        pages[2] = Some("Предисловие автора".to_string());
        pages[4] = Some("Глава 1. Введение\nТекст первой главы.".to_string());
        for p in 5..39 {
            pages[p] = Some(format!("Продолжение первой главы, страница {}.", p + 1));
        }
        pages[39] = Some("Глава 2. Основы\nТекст второй главы.".to_string());
        for p in 40..60 {
            pages[p] = Some(format!("Продолжение второй главы, страница {}.", p + 1));
        }
        MemoryPageSource::new(pages)
    }

    #[test]
    fn test_segment_book_end_to_end() {
        let source = two_chapter_book();
        let book = segment_book(&source, "Тестовая книга").unwrap();

        assert_eq!(book.title, "Тестовая книга");
        assert_eq!(book.chapters.len(), 2);

        match &book.chapters[0] {
            ChapterNode::Leaf { content, debug, .. } => {
                assert_eq!(debug.start_page, 5);
                // 第 40 页以第二章标题开头 → 不计入第一章
                assert_eq!(debug.end_page, 39);
                assert!(content.contains("--- Страница 5 ---"));
                assert!(content.contains("Текст первой главы"));
            }
            other => panic!("第一章应是叶子节点: {:?}", other),
        }
        match &book.chapters[1] {
            ChapterNode::Leaf { content, debug, .. } => {
                assert_eq!(debug.start_page, 40);
                assert_eq!(debug.end_page, 60);
                assert!(content.contains("Текст второй главы"));
            }
            other => panic!("第二章应是叶子节点: {:?}", other),
        }
    }

    #[test]
    fn test_segment_book_toc_not_found() {
        let source = MemoryPageSource::from_texts(&[
            "Обложка",
            "Просто текст без оглавления",
            "Ещё текст",
        ]);
        match segment_book(&source, "Книга") {
            Err(SegmentError::TocNotFound) => {}
            other => panic!("应返回 TocNotFound: {:?}", other),
        }
    }

    #[test]
    fn test_segment_book_no_entries_parsed() {
        let source = MemoryPageSource::from_texts(&[
            "Содержание\nздесь нет ни одной распознаваемой строки",
            "и дальше тоже",
        ]);
        match segment_book(&source, "Книга") {
            Err(SegmentError::NoEntriesParsed) => {}
            other => panic!("应返回 NoEntriesParsed: {:?}", other),
        }
    }

    #[test]
    fn test_book_serialization_shape() {
        let book = Book {
            title: "Книга".to_string(),
            chapters: vec![
                ChapterNode::Interior {
                    name: "Глава 1. Введение".to_string(),
                    chapters: vec![ChapterNode::Leaf {
                        name: "1.1 Постановка".to_string(),
                        content: "текст".to_string(),
                        debug: PageRange {
                            start_page: 5,
                            end_page: 9,
                        },
                    }],
                },
                ChapterNode::Leaf {
                    name: "Глава 2. Основы".to_string(),
                    content: "текст".to_string(),
                    debug: PageRange {
                        start_page: 10,
                        end_page: 20,
                    },
                },
            ],
        };

        let value = serde_json::to_value(&book).unwrap();
        // Interior 只有 name + chapters
        assert!(value["chapters"][0].get("chapters").is_some());
        assert!(value["chapters"][0].get("content").is_none());
        // Leaf 有 content + debug，没有 chapters
        assert!(value["chapters"][1].get("chapters").is_none());
        assert_eq!(value["chapters"][1]["debug"]["start_page"], 10);
        assert_eq!(value["chapters"][1]["debug"]["end_page"], 20);
    }

    #[test]
    fn test_book_round_trip() {
        let book = Book {
            title: "Книга".to_string(),
            chapters: vec![ChapterNode::Leaf {
                name: "Глава 1".to_string(),
                content: "содержимое".to_string(),
                debug: PageRange {
                    start_page: 3,
                    end_page: 7,
                },
            }],
        };
        let json = serde_json::to_string(&book).unwrap();
        let parsed: Book = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, book);
    }
}
