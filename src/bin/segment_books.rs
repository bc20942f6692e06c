/// 批量分割一个目录下的 PDF 书籍
///
/// 对目录中的每个 PDF 运行分割流水线，结果以 JSON 写到同名文件旁边。
/// 单本书失败不会中断批处理。
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use book_segmenter::{segment_book, PdfPageSource};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("用法: segment_books <PDF 目录>");
        return;
    }

    let folder = Path::new(&args[1]);
    if !folder.is_dir() {
        eprintln!("目录不存在: {:?}", folder);
        return;
    }

    let pdf_paths = match collect_pdfs(folder) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("读取目录失败: {}", e);
            return;
        }
    };
    if pdf_paths.is_empty() {
        println!("未找到 PDF 文件");
        return;
    }

    println!("发现 {} 个 PDF，开始处理...\n", pdf_paths.len());

    let mut success = 0;
    for path in &pdf_paths {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("<без имени>");
        println!("{}...", name);

        match process_one(path) {
            Ok(chapter_count) => {
                println!("  ✓ {} 个顶层章节", chapter_count);
                success += 1;
            }
            // 单本失败：记录并继续下一本
            Err(e) => eprintln!("  ✗ {}", e),
        }
    }

    println!("\n完成！成功处理 {}/{} 本书。", success, pdf_paths.len());
}

/// 收集目录中的所有 PDF 文件路径（按文件名排序）
fn collect_pdfs(folder: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();
    Ok(paths)
}

/// 处理一本书：分割并写出 JSON，返回顶层章节数
fn process_one(path: &Path) -> Result<usize, String> {
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("book");

    let source = PdfPageSource::from_path(path).map_err(|e| e.to_string())?;
    let book = segment_book(&source, title).map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&book).map_err(|e| e.to_string())?;
    let out_path = path.with_extension("json");
    fs::write(&out_path, json).map_err(|e| format!("写入 {} 失败: {}", out_path.display(), e))?;

    Ok(book.chapters.len())
}
