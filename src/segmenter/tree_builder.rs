use std::collections::HashMap;

use super::{ChapterBlock, ChapterNode, PageRange, TocEntry};

/// 目录条目未在正文中检测到时的叶子内容占位符
const NOT_FOUND_PLACEHOLDER: &str = "(Не найдено)";

/// 把扁平章节块折叠为层级章节树
///
/// 递归分组：每个层级为 L 的条目收集紧随其后、层级大于 L 的条目
/// 作为候选子组（遇到层级 ≤ L 的条目即终止），对子组递归构建。
/// 递归产生子节点的条目成为内部节点，否则成为叶子节点，
/// 叶子内容按标题精确查找章节块，未命中时填占位符。
///
/// 块映射按标题文本作键：重复标题会冲突，后出现的块静默覆盖
/// 先出现的（已知限制，见 DESIGN.md）。
pub fn build_tree(entries: &[TocEntry], blocks: &[ChapterBlock]) -> Vec<ChapterNode> {
    let by_title: HashMap<&str, &ChapterBlock> =
        blocks.iter().map(|b| (b.title.as_str(), b)).collect();
    build_group(entries, &by_title)
}

/// 对一段连续的条目递归构建节点列表
///
/// 分组基准取组内的最小层级：缺少中间层级的条目
/// （例如没有层级 2 父节点的层级 3 条目）仍会挂到
/// 最近的上层祖先之下，而不是被丢弃
fn build_group(group: &[TocEntry], blocks: &HashMap<&str, &ChapterBlock>) -> Vec<ChapterNode> {
    let Some(level) = group.iter().map(|e| e.level).min() else {
        return Vec::new();
    };

    let mut nodes = Vec::new();
    let mut i = 0;
    while i < group.len() {
        let entry = &group[i];
        if entry.level != level {
            i += 1;
            continue;
        }

        // 候选子组：紧随其后、层级更深的连续条目
        let mut j = i + 1;
        while j < group.len() && group[j].level > level {
            j += 1;
        }

        let children = build_group(&group[i + 1..j], blocks);
        if !children.is_empty() {
            nodes.push(ChapterNode::Interior {
                name: entry.title.clone(),
                chapters: children,
            });
        } else {
            let (content, debug) = match blocks.get(entry.title.as_str()) {
                Some(block) => (
                    block.content.clone(),
                    PageRange {
                        start_page: block.start_page,
                        end_page: block.end_page,
                    },
                ),
                // 标题从未在正文中检测到（例如只出现在页眉里）
                None => (
                    NOT_FOUND_PLACEHOLDER.to_string(),
                    PageRange {
                        start_page: 0,
                        end_page: 0,
                    },
                ),
            };
            nodes.push(ChapterNode::Leaf {
                name: entry.title.clone(),
                content,
                debug,
            });
        }

        i = j;
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, level: u8, page_start: usize) -> TocEntry {
        TocEntry {
            title: title.to_string(),
            level,
            page_start,
        }
    }

    fn block(title: &str, content: &str, start: usize, end: usize) -> ChapterBlock {
        ChapterBlock {
            title: title.to_string(),
            content: content.to_string(),
            start_page: start,
            end_page: end,
        }
    }

    fn leaf_count(nodes: &[ChapterNode]) -> usize {
        nodes
            .iter()
            .map(|n| match n {
                ChapterNode::Leaf { .. } => 1,
                ChapterNode::Interior { chapters, .. } => leaf_count(chapters),
            })
            .sum()
    }

    #[test]
    fn test_flat_entries_become_leaves() {
        let entries = vec![
            entry("Глава 1. Первая", 1, 5),
            entry("Глава 2. Вторая", 1, 20),
        ];
        let blocks = vec![
            block("Глава 1. Первая", "текст 1", 5, 19),
            block("Глава 2. Вторая", "текст 2", 20, 40),
        ];
        let tree = build_tree(&entries, &blocks);

        assert_eq!(tree.len(), 2);
        match &tree[0] {
            ChapterNode::Leaf { name, content, debug } => {
                assert_eq!(name, "Глава 1. Первая");
                assert_eq!(content, "текст 1");
                assert_eq!(debug.start_page, 5);
                assert_eq!(debug.end_page, 19);
            }
            other => panic!("应是叶子节点: {:?}", other),
        }
    }

    #[test]
    fn test_nested_entries_become_interior() {
        let entries = vec![
            entry("Глава 1. Первая", 1, 5),
            entry("1.1 Раздел", 2, 6),
            entry("1.2 Раздел", 2, 10),
            entry("Глава 2. Вторая", 1, 20),
        ];
        let blocks = vec![
            block("1.1 Раздел", "текст 1.1", 6, 9),
            block("1.2 Раздел", "текст 1.2", 10, 19),
            block("Глава 2. Вторая", "текст 2", 20, 40),
        ];
        let tree = build_tree(&entries, &blocks);

        assert_eq!(tree.len(), 2);
        match &tree[0] {
            ChapterNode::Interior { name, chapters } => {
                assert_eq!(name, "Глава 1. Первая");
                assert_eq!(chapters.len(), 2);
            }
            other => panic!("应是内部节点: {:?}", other),
        }
        assert!(matches!(&tree[1], ChapterNode::Leaf { .. }));
    }

    #[test]
    fn test_three_level_nesting() {
        let entries = vec![
            entry("Глава 1. Первая", 1, 5),
            entry("1.1 Раздел", 2, 6),
            entry("1.1.1 Подраздел", 3, 7),
            entry("1.1.2 Подраздел", 3, 8),
            entry("1.2 Раздел", 2, 10),
        ];
        let tree = build_tree(&entries, &[]);

        assert_eq!(tree.len(), 1);
        let ChapterNode::Interior { chapters, .. } = &tree[0] else {
            panic!("应是内部节点");
        };
        assert_eq!(chapters.len(), 2);
        let ChapterNode::Interior { chapters: sub, .. } = &chapters[0] else {
            panic!("1.1 应是内部节点");
        };
        assert_eq!(sub.len(), 2);
    }

    #[test]
    fn test_leaf_count_is_fold_invariant() {
        // 叶子数 == 其后紧跟的条目中没有更深一层的条目数
        let entries = vec![
            entry("Глава 1. Первая", 1, 5),
            entry("1.1 Раздел", 2, 6),
            entry("1.2 Раздел", 2, 10),
            entry("Глава 2. Вторая", 1, 20),
            entry("Глава 3. Третья", 1, 30),
        ];
        let tree = build_tree(&entries, &[]);
        // 叶子：1.1、1.2、Глава 2、Глава 3
        assert_eq!(leaf_count(&tree), 4);
    }

    #[test]
    fn test_orphan_level_three_nested_defensively() {
        // 层级 3 条目没有中间的层级 2 父节点：挂到最近的层级 1 之下
        let entries = vec![
            entry("Глава 1. Первая", 1, 5),
            entry("1.1.1 Подраздел", 3, 6),
            entry("Глава 2. Вторая", 1, 20),
        ];
        let tree = build_tree(&entries, &[]);

        assert_eq!(tree.len(), 2);
        let ChapterNode::Interior { chapters, .. } = &tree[0] else {
            panic!("Глава 1 应是内部节点");
        };
        assert_eq!(chapters.len(), 1);
        assert!(matches!(&chapters[0], ChapterNode::Leaf { name, .. } if name == "1.1.1 Подраздел"));
    }

    #[test]
    fn test_missing_block_gets_placeholder() {
        let entries = vec![entry("Глава 1. Первая", 1, 5)];
        let tree = build_tree(&entries, &[]);

        match &tree[0] {
            ChapterNode::Leaf { content, debug, .. } => {
                assert_eq!(content, "(Не найдено)");
                assert_eq!(debug.start_page, 0);
                assert_eq!(debug.end_page, 0);
            }
            other => panic!("应是叶子节点: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_titles_later_wins() {
        // 已知限制：同名标题在映射中冲突，后出现的块胜出
        let entries = vec![
            entry("Введение", 2, 5),
            entry("Введение", 2, 50),
        ];
        let blocks = vec![
            block("Введение", "первый блок", 5, 10),
            block("Введение", "второй блок", 50, 60),
        ];
        let tree = build_tree(&entries, &blocks);

        for node in &tree {
            match node {
                ChapterNode::Leaf { content, .. } => assert_eq!(content, "второй блок"),
                other => panic!("应是叶子节点: {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_entries() {
        assert!(build_tree(&[], &[]).is_empty());
    }
}
