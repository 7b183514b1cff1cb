use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::db::models::{Article, Section};

/// A compact article reference used inside the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub view_count: i64,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            view_count: article.view_count,
        }
    }
}

/// A section with its articles and nested subsections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub priority: i32,
    pub parent_id: Option<String>,
    pub articles: Vec<ArticleSummary>,
    pub children: Vec<SectionNode>,
}

/// The whole knowledge base arranged for navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Root sections, ordered by priority then name.
    pub sections: Vec<SectionNode>,
    /// Articles whose section no longer exists.
    pub orphaned_articles: Vec<ArticleSummary>,
}

/// Arrange sections into a tree and attach each article to its section.
///
/// A section whose parent is missing is promoted to a root. Sections caught
/// in a parent cycle are also promoted, so every section appears exactly once.
pub fn build_catalog(sections: &[Section], articles: &[Article]) -> Catalog {
    let mut ordered: Vec<&Section> = sections.iter().collect();
    ordered.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

    let known: HashSet<&str> = ordered.iter().map(|s| s.id.as_str()).collect();

    let mut articles_of: HashMap<&str, Vec<ArticleSummary>> = HashMap::new();
    let mut orphaned_articles = Vec::new();
    for article in articles {
        if known.contains(article.section_id.as_str()) {
            articles_of
                .entry(article.section_id.as_str())
                .or_default()
                .push(ArticleSummary::from(article));
        } else {
            orphaned_articles.push(ArticleSummary::from(article));
        }
    }

    let mut children_of: HashMap<&str, Vec<&Section>> = HashMap::new();
    let mut roots = Vec::new();
    for section in &ordered {
        match section.parent_id.as_deref() {
            Some(parent) if parent != section.id && known.contains(parent) => {
                children_of.entry(parent).or_default().push(*section);
            }
            _ => roots.push(*section),
        }
    }

    let mut visited = HashSet::new();
    let mut nodes: Vec<SectionNode> = roots
        .into_iter()
        .map(|root| build_node(root, &children_of, &articles_of, &mut visited))
        .collect();

    for section in &ordered {
        if !visited.contains(section.id.as_str()) {
            tracing::warn!(section_id = %section.id, "Section is part of a parent cycle");
            nodes.push(build_node(*section, &children_of, &articles_of, &mut visited));
        }
    }

    Catalog {
        sections: nodes,
        orphaned_articles,
    }
}

fn build_node<'a>(
    section: &'a Section,
    children_of: &HashMap<&str, Vec<&'a Section>>,
    articles_of: &HashMap<&str, Vec<ArticleSummary>>,
    visited: &mut HashSet<&'a str>,
) -> SectionNode {
    visited.insert(section.id.as_str());

    let mut children = Vec::new();
    for child in children_of.get(section.id.as_str()).into_iter().flatten() {
        if !visited.contains(child.id.as_str()) {
            children.push(build_node(*child, children_of, articles_of, visited));
        }
    }

    SectionNode {
        id: section.id.clone(),
        name: section.name.clone(),
        priority: section.priority,
        parent_id: section.parent_id.clone(),
        articles: articles_of
            .get(section.id.as_str())
            .cloned()
            .unwrap_or_default(),
        children,
    }
}

/// Returns `true` if making `new_parent` the parent of `section_id` would
/// make the section its own ancestor.
pub fn creates_cycle(sections: &[Section], section_id: &str, new_parent: &str) -> bool {
    let parent_of: HashMap<&str, Option<&str>> = sections
        .iter()
        .map(|s| (s.id.as_str(), s.parent_id.as_deref()))
        .collect();

    let mut current = Some(new_parent);
    let mut steps = 0;
    while let Some(id) = current {
        if id == section_id {
            return true;
        }
        steps += 1;
        if steps > sections.len() {
            // Already cyclic above us; refuse to attach.
            return true;
        }
        current = parent_of.get(id).copied().flatten();
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn section(id: &str, name: &str, priority: i32, parent: Option<&str>) -> Section {
        let now = Utc::now();
        Section {
            id: id.to_string(),
            name: name.to_string(),
            priority,
            parent_id: parent.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    fn article(id: &str, title: &str, section_id: &str) -> Article {
        let now = Utc::now();
        Article {
            id: id.to_string(),
            title: title.to_string(),
            content: "<p>body</p>".to_string(),
            author: "Author".to_string(),
            date: "01.01.2024".to_string(),
            section_id: section_id.to_string(),
            acknowledged: vec![],
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_roots_sorted_by_priority() {
        let sections = vec![
            section("design", "Design", 3, None),
            section("general", "General", 1, None),
            section("dev", "Development", 2, None),
        ];

        let catalog = build_catalog(&sections, &[]);
        let ids: Vec<&str> = catalog.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["general", "dev", "design"]);
    }

    #[test]
    fn test_articles_attach_by_section_id() {
        let sections = vec![
            section("general", "General", 1, None),
            section("dev", "Development", 2, None),
        ];
        let articles = vec![
            article("a1", "Basics", "general"),
            article("a2", "Coding standards", "dev"),
        ];

        let catalog = build_catalog(&sections, &articles);
        assert_eq!(catalog.sections[0].articles[0].id, "a1");
        assert_eq!(catalog.sections[1].articles[0].id, "a2");
        assert!(catalog.orphaned_articles.is_empty());
    }

    #[test]
    fn test_priority_change_keeps_articles() {
        let mut sections = vec![section("dev", "Development", 2, None)];
        let articles = vec![article("a1", "Coding standards", "dev")];

        sections[0].priority = 42;
        let catalog = build_catalog(&sections, &articles);
        assert_eq!(catalog.sections[0].articles.len(), 1);
        assert!(catalog.orphaned_articles.is_empty());
    }

    #[test]
    fn test_orphaned_articles_reported() {
        let sections = vec![section("general", "General", 1, None)];
        let articles = vec![
            article("a1", "Basics", "general"),
            article("a2", "Lost", "deleted-section"),
        ];

        let catalog = build_catalog(&sections, &articles);
        assert_eq!(catalog.orphaned_articles.len(), 1);
        assert_eq!(catalog.orphaned_articles[0].id, "a2");
    }

    #[test]
    fn test_nested_sections() {
        let sections = vec![
            section("dev", "Development", 1, None),
            section("backend", "Backend", 2, Some("dev")),
            section("frontend", "Frontend", 1, Some("dev")),
        ];

        let catalog = build_catalog(&sections, &[]);
        assert_eq!(catalog.sections.len(), 1);
        let children: Vec<&str> = catalog.sections[0]
            .children
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(children, vec!["frontend", "backend"]);
    }

    #[test]
    fn test_missing_parent_promotes_to_root() {
        let sections = vec![section("child", "Child", 1, Some("gone"))];
        let catalog = build_catalog(&sections, &[]);
        assert_eq!(catalog.sections.len(), 1);
        assert_eq!(catalog.sections[0].id, "child");
    }

    #[test]
    fn test_cycle_sections_still_listed_once() {
        let sections = vec![
            section("a", "A", 1, Some("b")),
            section("b", "B", 2, Some("a")),
        ];

        let catalog = build_catalog(&sections, &[]);
        assert_eq!(catalog.sections.len(), 1);
        assert_eq!(catalog.sections[0].id, "a");
        assert_eq!(catalog.sections[0].children[0].id, "b");
        assert!(catalog.sections[0].children[0].children.is_empty());
    }

    #[test]
    fn test_creates_cycle() {
        let sections = vec![
            section("root", "Root", 1, None),
            section("mid", "Mid", 1, Some("root")),
            section("leaf", "Leaf", 1, Some("mid")),
        ];

        assert!(creates_cycle(&sections, "root", "leaf"));
        assert!(creates_cycle(&sections, "mid", "mid"));
        assert!(!creates_cycle(&sections, "leaf", "root"));
        assert!(!creates_cycle(&sections, "root", "unknown"));
    }
}
