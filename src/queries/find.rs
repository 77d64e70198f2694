//! Filter queries that return articles (or a count of them).

use super::{QuerySpec, case_insensitive, contains_pattern};
use crate::models::{DateRange, ReporterName};
use mongodb::bson::{Document, doc};

const ARTICLE: &str = "article";
const ORIGINAL_SOURCE: &str = "The New York Times";

/// #3 Search `lead_paragraph`, `snippet` and `abstract` for the user's words.
pub fn search_in_articles(user_entry: &str) -> QuerySpec {
    let pattern = contains_pattern(user_entry);
    QuerySpec::find(doc! {
        "$and": [
            { "document_type": ARTICLE },
            {
                "$or": [
                    { "lead_paragraph": case_insensitive(pattern.clone()) },
                    { "snippet": case_insensitive(pattern.clone()) },
                    { "abstract": case_insensitive(pattern) },
                ]
            },
        ]
    })
}

/// #4 Articles where one byline person with the `reported` role matches the name.
///
/// All name parts are matched against the same person entry.
pub fn search_articles_reporter_name(name: &ReporterName) -> QuerySpec {
    let mut person = Document::new();
    person.insert("firstname", case_insensitive(contains_pattern(&name.first)));
    if let Some(middle) = &name.middle {
        person.insert("middlename", case_insensitive(contains_pattern(middle)));
    }
    person.insert("lastname", case_insensitive(contains_pattern(&name.last)));
    person.insert("role", "reported");

    QuerySpec::find(doc! {
        "$and": [
            { "byline.person": { "$elemMatch": person } },
            { "document_type": ARTICLE },
        ]
    })
}

/// #5 Articles tagged with a matching person or organization keyword.
pub fn search_people_or_organization(search_string: &str, is_person: bool) -> QuerySpec {
    let kind = if is_person { "persons" } else { "organizations" };
    QuerySpec::find(doc! {
        "keywords": {
            "$elemMatch": {
                "name": kind,
                "value": case_insensitive(contains_pattern(search_string)),
            }
        }
    })
}

/// #6 Articles printed on the given page. `print_page` is stored as a string.
pub fn xpage_articles(page_number: u32) -> QuerySpec {
    QuerySpec::find(doc! {
        "$and": [
            { "print_page": page_number.to_string() },
            { "document_type": ARTICLE },
        ]
    })
}

/// #8 The article with the highest word count.
pub fn longest_article() -> QuerySpec {
    QuerySpec::Find {
        filter: doc! { "document_type": ARTICLE },
        sort: Some(doc! { "word_count": -1 }),
        limit: Some(1),
    }
}

/// #9 How many records carry the Times itself as their source.
pub fn count_original_articles() -> QuerySpec {
    QuerySpec::Count {
        filter: doc! { "source": ORIGINAL_SOURCE },
    }
}

/// #10 Articles published strictly between the two dates.
///
/// `pub_date` is an ISO-8601 string, so plain string comparison orders it.
pub fn articles_between(range: &DateRange) -> QuerySpec {
    QuerySpec::find(published_within(range))
}

/// #15 The ten longest front-page articles published between the two dates.
pub fn front_page_articles(range: &DateRange) -> QuerySpec {
    QuerySpec::Find {
        filter: doc! {
            "$and": [
                { "print_page": "1" },
                { "document_type": ARTICLE },
                published_within(range),
            ]
        },
        sort: Some(doc! { "word_count": -1 }),
        limit: Some(10),
    }
}

fn published_within(range: &DateRange) -> Document {
    doc! {
        "$and": [
            { "pub_date": { "$gt": range.begin_str() } },
            { "pub_date": { "$lt": range.end_str() } },
        ]
    }
}
