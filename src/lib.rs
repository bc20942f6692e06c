//! 文档分割引擎
//!
//! 给定一本书逐页提取的文本：定位并解析目录为有序的分层标题列表，
//! 然后遍历页面流把原始文本切分为逐章文本块，容忍 OCR 噪声、断词
//! 和目录页码不准，最后把扁平章节列表折叠为层级树。
//!
//! 数据严格单向流动：原始目录行 → 条目 → (条目 + 页面流) → 扁平块 → 树。

pub mod page_source;
pub mod segmenter;

pub use page_source::{MemoryPageSource, PageSource, PdfPageSource};
pub use segmenter::{
    segment_book, Book, ChapterBlock, ChapterNode, PageRange, SegmentError, TocEntry,
};
