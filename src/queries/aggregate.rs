//! Aggregation pipelines: keyword rankings, top reporters, sections, months.
//!
//! Pipelines that name a single winner end in `$limit: 1`; the caller reads
//! the first row (or reports that there is none).

use super::{QuerySpec, non_empty};
use crate::config::Phase;
use itertools::Itertools;
use mongodb::bson::{Document, doc};

/// Field under which grouped rows carry their tally.
pub const COUNT: &str = "count";
pub const ARTICLE_COUNT: &str = "article_count";
pub const ORGANIZATION_COUNT: &str = "organization_count";

/// `^(2005|2006|2007)`: `pub_date` starts with one of the phase's years.
pub fn phase_pattern(phase: &Phase) -> String {
    format!("^({})", phase.years().join("|"))
}

/// unwind keywords → count each distinct keyword → most frequent first → top `limit`.
fn keyword_ranking(matcher: Document, limit: i64) -> Vec<Document> {
    vec![
        doc! { "$match": matcher },
        doc! { "$unwind": "$keywords" },
        doc! { "$group": { "_id": "$keywords", (COUNT): { "$sum": 1 } } },
        doc! { "$sort": { (COUNT): -1 } },
        doc! { "$limit": limit },
    ]
}

/// #1 Top ten keywords for each phase, in phase order.
pub fn compare_news_keywords(phases: &[Phase]) -> Vec<QuerySpec> {
    phases
        .iter()
        .map(|phase| {
            QuerySpec::aggregate(keyword_ranking(
                doc! { "pub_date": { "$regex": phase_pattern(phase) } },
                10,
            ))
        })
        .collect()
}

/// #2 The five most frequent keywords across all `News` material.
pub fn most_popular_news_keywords() -> QuerySpec {
    QuerySpec::aggregate(keyword_ranking(doc! { "type_of_material": "News" }, 5))
}

/// #7 The person credited with `reported` on the most articles.
///
/// Rows are grouped on the name parts only; `rank` differs per article.
pub fn most_productive_reporter() -> QuerySpec {
    QuerySpec::aggregate(vec![
        doc! {
            "$match": {
                "byline.person": {
                    "$elemMatch": { "role": "reported", "firstname": non_empty() }
                }
            }
        },
        doc! { "$unwind": "$byline.person" },
        doc! {
            "$match": {
                "byline.person.role": "reported",
                "byline.person.firstname": non_empty(),
            }
        },
        doc! {
            "$group": {
                "_id": {
                    "firstname": "$byline.person.firstname",
                    "middlename": "$byline.person.middlename",
                    "lastname": "$byline.person.lastname",
                },
                (ARTICLE_COUNT): { "$sum": 1 },
            }
        },
        doc! { "$sort": { (ARTICLE_COUNT): -1 } },
        doc! { "$limit": 1 },
    ])
}

/// #11 The organization keyword that appears most often.
pub fn most_organization() -> QuerySpec {
    QuerySpec::aggregate(vec![
        doc! { "$unwind": "$keywords" },
        doc! {
            "$match": {
                "$and": [
                    { "keywords.name": "organizations" },
                    { "keywords.value": non_empty() },
                ]
            }
        },
        doc! { "$group": { "_id": "$keywords.value", (ORGANIZATION_COUNT): { "$sum": 1 } } },
        doc! { "$sort": { (ORGANIZATION_COUNT): -1 } },
        doc! { "$limit": 1 },
    ])
}

/// #12 The section with the most articles.
pub fn most_section() -> QuerySpec {
    QuerySpec::aggregate(vec![
        doc! { "$match": { "section_name": non_empty() } },
        doc! { "$group": { "_id": "$section_name", (ARTICLE_COUNT): { "$sum": 1 } } },
        doc! { "$sort": { (ARTICLE_COUNT): -1 } },
        doc! { "$limit": 1 },
    ])
}

/// #13 Every `type_of_material` with its article count, largest first.
pub fn list_articles_type_of_materials() -> QuerySpec {
    QuerySpec::aggregate(vec![
        doc! { "$group": { "_id": "$type_of_material", (COUNT): { "$sum": 1 } } },
        doc! { "$sort": { (COUNT): -1 } },
    ])
}

/// #14 The `YYYY-MM` month with the most records.
pub fn highest_articles_month() -> QuerySpec {
    QuerySpec::aggregate(vec![
        doc! { "$match": { "pub_date": non_empty() } },
        doc! {
            "$group": {
                "_id": { "$substrBytes": ["$pub_date", 0, 7] },
                (COUNT): { "$sum": 1 },
            }
        },
        doc! { "$sort": { (COUNT): -1 } },
        doc! { "$limit": 1 },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline(spec: QuerySpec) -> Vec<Document> {
        match spec {
            QuerySpec::Aggregate { pipeline } => pipeline,
            other => panic!("expected an aggregation, got {other:?}"),
        }
    }

    #[test]
    fn test_phase_pattern() {
        assert_eq!(phase_pattern(&Phase::new(2005, 2007)), "^(2005|2006|2007)");
        assert_eq!(phase_pattern(&Phase::new(2000, 2000)), "^(2000)");
    }

    #[test]
    fn test_compare_news_keywords() {
        let specs = compare_news_keywords(&[Phase::new(2005, 2007), Phase::new(2015, 2017)]);
        assert_eq!(specs.len(), 2);

        let expected_first = vec![
            doc! { "$match": { "pub_date": { "$regex": "^(2005|2006|2007)" } } },
            doc! { "$unwind": "$keywords" },
            doc! { "$group": { "_id": "$keywords", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
            doc! { "$limit": 10_i64 },
        ];
        assert_eq!(pipeline(specs[0].clone()), expected_first);

        let second = pipeline(specs[1].clone());
        assert_eq!(
            second[0],
            doc! { "$match": { "pub_date": { "$regex": "^(2015|2016|2017)" } } }
        );
    }

    #[test]
    fn test_most_popular_news_keywords() {
        let expected = vec![
            doc! { "$match": { "type_of_material": "News" } },
            doc! { "$unwind": "$keywords" },
            doc! { "$group": { "_id": "$keywords", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
            doc! { "$limit": 5_i64 },
        ];
        assert_eq!(pipeline(most_popular_news_keywords()), expected);
    }

    #[test]
    fn test_most_productive_reporter() {
        let stages = pipeline(most_productive_reporter());
        assert_eq!(stages.len(), 6);
        assert_eq!(stages[1], doc! { "$unwind": "$byline.person" });
        assert_eq!(
            stages[2],
            doc! {
                "$match": {
                    "byline.person.role": "reported",
                    "byline.person.firstname": { "$regex": ".+" },
                }
            }
        );
        assert_eq!(
            stages[3],
            doc! {
                "$group": {
                    "_id": {
                        "firstname": "$byline.person.firstname",
                        "middlename": "$byline.person.middlename",
                        "lastname": "$byline.person.lastname",
                    },
                    "article_count": { "$sum": 1 },
                }
            }
        );
        assert_eq!(stages[4], doc! { "$sort": { "article_count": -1 } });
        assert_eq!(stages[5], doc! { "$limit": 1 });
    }

    #[test]
    fn test_most_organization() {
        let expected = vec![
            doc! { "$unwind": "$keywords" },
            doc! {
                "$match": {
                    "$and": [
                        { "keywords.name": "organizations" },
                        { "keywords.value": { "$regex": ".+" } },
                    ]
                }
            },
            doc! { "$group": { "_id": "$keywords.value", "organization_count": { "$sum": 1 } } },
            doc! { "$sort": { "organization_count": -1 } },
            doc! { "$limit": 1 },
        ];
        assert_eq!(pipeline(most_organization()), expected);
    }

    #[test]
    fn test_most_section() {
        let expected = vec![
            doc! { "$match": { "section_name": { "$regex": ".+" } } },
            doc! { "$group": { "_id": "$section_name", "article_count": { "$sum": 1 } } },
            doc! { "$sort": { "article_count": -1 } },
            doc! { "$limit": 1 },
        ];
        assert_eq!(pipeline(most_section()), expected);
    }

    #[test]
    fn test_list_articles_type_of_materials() {
        let expected = vec![
            doc! { "$group": { "_id": "$type_of_material", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
        ];
        assert_eq!(pipeline(list_articles_type_of_materials()), expected);
    }

    #[test]
    fn test_highest_articles_month() {
        let stages = pipeline(highest_articles_month());
        assert_eq!(
            stages[1],
            doc! {
                "$group": {
                    "_id": { "$substrBytes": ["$pub_date", 0, 7] },
                    "count": { "$sum": 1 },
                }
            }
        );
        assert_eq!(stages.last(), Some(&doc! { "$limit": 1 }));
    }
}
