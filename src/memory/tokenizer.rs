//! 分词与词法相似度
//!
//! 中文走 jieba 搜索引擎模式，其余按空白切分；未配置嵌入模型时，长期记忆用词重叠打分检索。

use std::collections::HashSet;
use std::sync::OnceLock;

use jieba_rs::Jieba;

static JIEBA: OnceLock<Jieba> = OnceLock::new();

fn get_jieba() -> &'static Jieba {
    JIEBA.get_or_init(Jieba::new)
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}' |
        '\u{3400}'..='\u{4DBF}' |
        '\u{F900}'..='\u{FAFF}' |
        '\u{3040}'..='\u{309F}' |
        '\u{30A0}'..='\u{30FF}'
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// 去掉词两端的标点（`input:`、`？` 之类不参与打分）
fn strip_punct(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric() && !is_cjk(c))
}

/// 中英文混合分词，返回小写词集合
pub fn tokenize_to_set(text: &str) -> HashSet<String> {
    let text = text.trim();
    if text.is_empty() {
        return HashSet::new();
    }
    if contains_cjk(text) {
        get_jieba()
            .cut_for_search(text, true)
            .into_iter()
            .map(strip_punct)
            .filter(|w| !w.is_empty())
            .filter(|w| w.chars().count() > 1 || w.chars().next().is_some_and(is_cjk))
            .map(str::to_lowercase)
            .collect()
    } else {
        text.split_whitespace()
            .map(strip_punct)
            .filter(|w| w.chars().count() > 1)
            .map(str::to_lowercase)
            .collect()
    }
}

/// 词重叠相似度：交集 / 查询词数，范围 [0, 1]
pub fn lexical_similarity(query: &HashSet<String>, doc: &HashSet<String>) -> f32 {
    if query.is_empty() || doc.is_empty() {
        return 0.0;
    }
    query.intersection(doc).count() as f32 / query.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_english_strips_punct() {
        let set = tokenize_to_set("input: Rust, ownership?");
        assert!(set.contains("input"));
        assert!(set.contains("rust"));
        assert!(set.contains("ownership"));
    }

    #[test]
    fn test_tokenize_chinese() {
        let set = tokenize_to_set("我喜欢学习Rust编程");
        assert!(!set.is_empty());
        assert!(set.contains("rust"));
    }

    #[test]
    fn test_lexical_similarity() {
        let q = tokenize_to_set("rust ownership rules");
        let d = tokenize_to_set("the rust ownership model");
        let s = lexical_similarity(&q, &d);
        assert!(s > 0.5 && s < 1.0);
        assert_eq!(lexical_similarity(&q, &HashSet::new()), 0.0);
    }
}
