use std::fs;
use std::path::Path;

use crate::segmenter::SegmentError;

/// 页面源
///
/// 核心消费的页面流契约：按 1 起页码提供文本，读取幂等、只读。
/// 无法提取文本的页面（扫描页）返回 None
pub trait PageSource {
    /// 总页数
    fn page_count(&self) -> usize;

    /// 指定页的文本
    ///
    /// # 参数
    /// - `page_number`: 物理页码（1 起）
    ///
    /// # 返回
    /// 页面文本；页码越界或页面无文本时为 None
    fn page_text(&self, page_number: usize) -> Option<String>;
}

/// PDF 页面源
///
/// 用 pdf-extract 一次性按页提取全书文本并缓存，
/// 空白页（扫描页）映射为 None
pub struct PdfPageSource {
    pages: Vec<Option<String>>,
}

impl PdfPageSource {
    /// 从文件路径构建页面源
    pub fn from_path(path: &Path) -> Result<Self, SegmentError> {
        let bytes = fs::read(path)
            .map_err(|e| SegmentError::PageSource(format!("读取文件失败: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// 从内存中的 PDF 字节构建页面源
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SegmentError> {
        let raw_pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| SegmentError::PageSource(format!("PDF 解析失败: {}", e)))?;
        let pages = raw_pages
            .into_iter()
            .map(|text| {
                if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                }
            })
            .collect();
        Ok(Self { pages })
    }
}

impl PageSource for PdfPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_number: usize) -> Option<String> {
        if page_number == 0 {
            return None;
        }
        self.pages.get(page_number - 1).cloned().flatten()
    }
}

/// 内存页面源
///
/// 直接持有每页文本，用于测试和非 PDF 的调用方
pub struct MemoryPageSource {
    pages: Vec<Option<String>>,
}

impl MemoryPageSource {
    /// 从每页的可选文本构建
    pub fn new(pages: Vec<Option<String>>) -> Self {
        Self { pages }
    }

    /// 从字符串切片构建；空串视为无文本页
    pub fn from_texts(texts: &[&str]) -> Self {
        let pages = texts
            .iter()
            .map(|t| {
                if t.trim().is_empty() {
                    None
                } else {
                    Some(t.to_string())
                }
            })
            .collect();
        Self { pages }
    }
}

impl PageSource for MemoryPageSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_number: usize) -> Option<String> {
        if page_number == 0 {
            return None;
        }
        self.pages.get(page_number - 1).cloned().flatten()
    }
}
