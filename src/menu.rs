//! The interactive query menu.
//!
//! A session asks whether to query at all, shows the fifteen canned queries,
//! prompts for whatever parameters the chosen query needs, runs it, prints
//! the result and offers to go again.
//!
//! Input and output are generic ([`BufRead`] / [`Write`]) so whole sessions
//! can be driven from a string in tests.

use crate::config::Phase;
use crate::models::{DateRange, ReporterName};
use crate::outputs::{QueryReport, console, json};
use crate::queries::aggregate::{
    self, compare_news_keywords, highest_articles_month, list_articles_type_of_materials,
    most_organization, most_popular_news_keywords, most_productive_reporter, most_section,
};
use crate::queries::count_field;
use crate::queries::find::{
    articles_between, count_original_articles, front_page_articles, longest_article,
    search_articles_reporter_name, search_in_articles, search_people_or_organization,
    xpage_articles,
};
use crate::store::QueryRunner;
use chrono::NaiveDate;
use std::error::Error;
use std::io::{self, BufRead, Write};
use thiserror::Error as ThisError;
use tracing::{error, info, instrument, warn};

/// Problems with something typed at a prompt. Shown to the user, who is
/// asked again.
#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum InputError {
    #[error("Choose between 1 and 15 only...")]
    MenuChoice(String),

    #[error("Please enter the first, middle and last name separated by spaces (got {0} parts)")]
    ReporterName(usize),

    #[error("`{0}` is not a page number")]
    PageNumber(String),

    #[error("`{0}` is not a date in yyyy-mm-dd format")]
    Date(String),

    #[error("Please enter exactly two dates separated by a space")]
    DateCount,

    #[error("The end date must come after the begin date")]
    DateOrder,
}

/// The fifteen canned queries, numbered as on the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CompareKeywords = 1,
    PopularKeywords = 2,
    SearchArticles = 3,
    ReporterArticles = 4,
    PeopleOrOrganizations = 5,
    PageArticles = 6,
    ProductiveReporter = 7,
    LongestArticle = 8,
    OriginalArticleCount = 9,
    ArticlesBetween = 10,
    TopOrganization = 11,
    TopSection = 12,
    TypesOfMaterial = 13,
    BusiestMonth = 14,
    FrontPageArticles = 15,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 15] = [
        Self::CompareKeywords,
        Self::PopularKeywords,
        Self::SearchArticles,
        Self::ReporterArticles,
        Self::PeopleOrOrganizations,
        Self::PageArticles,
        Self::ProductiveReporter,
        Self::LongestArticle,
        Self::OriginalArticleCount,
        Self::ArticlesBetween,
        Self::TopOrganization,
        Self::TopSection,
        Self::TypesOfMaterial,
        Self::BusiestMonth,
        Self::FrontPageArticles,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::CompareKeywords => {
                "Compare the top news keywords of each phase of years (2005-2007 vs 2015-2017 by default)"
            }
            Self::PopularKeywords => "Find the most popular news keywords from the entire archives collection",
            Self::SearchArticles => "Search for articles based on user entry",
            Self::ReporterArticles => "Find articles by reporter name",
            Self::PeopleOrOrganizations => "Find articles about specific people or organizations",
            Self::PageArticles => "Find the articles that have occurred on page# x over these years",
            Self::ProductiveReporter => "Find the most productive reporter",
            Self::LongestArticle => "Find the longest article (word count)",
            Self::OriginalArticleCount => "Find the number of original articles from NYT (source)",
            Self::ArticlesBetween => "Find the articles published in a certain time range",
            Self::TopOrganization => "Find the organization that appears the most in NYT",
            Self::TopSection => "Find the section name with the maximum number of articles",
            Self::TypesOfMaterial => "List all the types of material with article count",
            Self::BusiestMonth => "Find which month had the highest number of articles",
            Self::FrontPageArticles => "Find the 10 longest front page articles in a given timeframe",
        }
    }
}

impl TryFrom<u8> for MenuChoice {
    type Error = InputError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        n.checked_sub(1)
            .and_then(|i| Self::ALL.get(usize::from(i)).copied())
            .ok_or_else(|| InputError::MenuChoice(n.to_string()))
    }
}

pub fn parse_menu_choice(s: &str) -> Result<MenuChoice, InputError> {
    s.trim()
        .parse::<u8>()
        .map_err(|_| InputError::MenuChoice(s.trim().to_string()))
        .and_then(MenuChoice::try_from)
}

/// `First Middle Last`, with `-` standing in for a missing middle name.
/// `First Last` is accepted too.
pub fn parse_reporter_name(s: &str) -> Result<ReporterName, InputError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    match parts.as_slice() {
        [first, middle, last] => Ok(ReporterName {
            first: first.to_string(),
            middle: (*middle != "-").then(|| middle.to_string()),
            last: last.to_string(),
        }),
        [first, last] => Ok(ReporterName {
            first: first.to_string(),
            middle: None,
            last: last.to_string(),
        }),
        _ => Err(InputError::ReporterName(parts.len())),
    }
}

pub fn parse_page_number(s: &str) -> Result<u32, InputError> {
    match s.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(InputError::PageNumber(s.trim().to_string())),
    }
}

/// `yyyy-mm-dd yyyy-mm-dd`
pub fn parse_date_range(s: &str) -> Result<DateRange, InputError> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let [begin, end] = parts.as_slice() else {
        return Err(InputError::DateCount);
    };
    let parse = |d: &str| {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| InputError::Date(d.to_string()))
    };
    let range = DateRange {
        begin: parse(*begin)?,
        end: parse(*end)?,
    };
    if range.begin >= range.end {
        return Err(InputError::DateOrder);
    }
    Ok(range)
}

/// Anything but `N` counts as "yes, a person".
pub fn parse_person_flag(s: &str) -> bool {
    !s.trim().eq_ignore_ascii_case("n")
}

/// Line-oriented prompting over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Show `prompt` and read one trimmed line. `None` once input is exhausted.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Ask until `parse` accepts the answer, printing each rejection.
    pub fn ask_with<T>(
        &mut self,
        prompt: &str,
        parse: impl Fn(&str) -> Result<T, InputError>,
    ) -> io::Result<Option<T>> {
        loop {
            let Some(line) = self.ask(prompt)? else {
                return Ok(None);
            };
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }
    }

    /// `Y`/`y` is yes; anything else, including end of input, is no.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(matches!(self.ask(prompt)?.as_deref(), Some("Y" | "y")))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

const REPORTER_PROMPT: &str = "Please enter the First name, Middle name and Last name of the reporter separated by spaces.
Note: If the person doesn't have a middle name, please use `-` instead.
For eg: Constance L. HAYS
        Nicholas - Cage
:: ";

const DATE_RANGE_PROMPT: &str = "Enter the begin date (yyyy-mm-dd) and the end date (yyyy-mm-dd) separated by a space.
For eg: 2005-09-11 2006-10-01
:: ";

/// Print the numbered menu.
pub fn render_menu<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "::NYT Archiver::")?;
    writeln!(out)?;
    for choice in MenuChoice::ALL {
        writeln!(out, "{:>3}. {}", choice.number(), choice.title())?;
    }
    writeln!(out)
}

/// Everything a query needs besides the prompter.
pub struct Session<'a, Q> {
    pub runner: &'a Q,
    pub phases: &'a [Phase],
    pub export_dir: Option<&'a str>,
}

impl<'a, Q: QueryRunner> Session<'a, Q> {
    pub fn new(runner: &'a Q, phases: &'a [Phase], export_dir: Option<&'a str>) -> Self {
        Self {
            runner,
            phases,
            export_dir,
        }
    }

    /// The menu loop. Returns how many queries completed.
    pub async fn run_interactive<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
    ) -> Result<usize, Box<dyn Error>> {
        let mut completed = 0;
        if !prompter.confirm("Query the dataset? [Y/N] ")? {
            return Ok(completed);
        }

        loop {
            render_menu(prompter.output())?;
            let Some(choice) =
                prompter.ask_with("Choose the query you want to execute [1-15]: ", parse_menu_choice)?
            else {
                break;
            };
            if self.run_once(prompter, choice).await? {
                completed += 1;
            }
            if !prompter.confirm("Query again? [Y/N] ")? {
                break;
            }
        }
        Ok(completed)
    }

    /// Run one query and print it. Returns `false` if it did not complete.
    ///
    /// A failing query is reported and does not end the session.
    #[instrument(level = "info", skip(self, prompter), fields(query = choice.number()))]
    pub async fn run_once<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
        choice: MenuChoice,
    ) -> Result<bool, Box<dyn Error>> {
        let report = match self.execute(prompter, choice).await {
            Ok(Some(report)) => report,
            Ok(None) => {
                info!("Input closed before the query could run");
                return Ok(false);
            }
            Err(e) => {
                error!(error = %e, "Query failed");
                writeln!(prompter.output(), "Query #{} failed: {e}", choice.number())?;
                return Ok(false);
            }
        };

        console::render_report(&report, prompter.output())?;

        if let Some(dir) = self.export_dir {
            if let Err(e) = json::write_report(&report, dir).await {
                warn!(error = %e, dir, "Failed to write JSON copy of the result");
            }
        }
        Ok(true)
    }

    /// Collect parameters for `choice`, run its queries and build the report.
    /// `None` when input ran out while prompting.
    pub async fn execute<R: BufRead, W: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
        choice: MenuChoice,
    ) -> Result<Option<QueryReport>, Box<dyn Error>> {
        let mut report = QueryReport::new(choice);

        match choice {
            MenuChoice::CompareKeywords => {
                let specs = compare_news_keywords(self.phases);
                for (i, (phase, spec)) in self.phases.iter().zip(specs).enumerate() {
                    report.push(
                        format!(
                            "Phase {} ({}-{}) keywords and their counts:",
                            i + 1,
                            phase.start_year,
                            phase.end_year
                        ),
                        self.runner.run(&spec).await?,
                    );
                }
            }
            MenuChoice::PopularKeywords => {
                report.push(
                    "5 Most popular keywords are:",
                    self.runner.run(&most_popular_news_keywords()).await?,
                );
            }
            MenuChoice::SearchArticles => {
                let Some(entry) = prompter.ask("Input what you want to search within: ")? else {
                    return Ok(None);
                };
                report.push(
                    "Matching articles:",
                    self.runner.run(&search_in_articles(&entry)).await?,
                );
            }
            MenuChoice::ReporterArticles => {
                let Some(name) = prompter.ask_with(REPORTER_PROMPT, parse_reporter_name)? else {
                    return Ok(None);
                };
                report.push(
                    "Articles by the person:",
                    self.runner.run(&search_articles_reporter_name(&name)).await?,
                );
            }
            MenuChoice::PeopleOrOrganizations => {
                let Some(name) = prompter.ask("Input the organization or person's name to search: ")?
                else {
                    return Ok(None);
                };
                let Some(answer) = prompter.ask("Is it a person? [Y/N] ")? else {
                    return Ok(None);
                };
                let spec = search_people_or_organization(&name, parse_person_flag(&answer));
                report.push("Matching articles:", self.runner.run(&spec).await?);
            }
            MenuChoice::PageArticles => {
                let Some(page) =
                    prompter.ask_with("Enter the page number to search for: ", parse_page_number)?
                else {
                    return Ok(None);
                };
                report.push(
                    format!("Articles on the page#{page} are:"),
                    self.runner.run(&xpage_articles(page)).await?,
                );
            }
            MenuChoice::ProductiveReporter => {
                report.push(
                    "Most productive reporter:",
                    self.runner.run(&most_productive_reporter()).await?,
                );
            }
            MenuChoice::LongestArticle => {
                report.push("Longest article:", self.runner.run(&longest_article()).await?);
            }
            MenuChoice::OriginalArticleCount => {
                report.push(
                    "Number of original articles:",
                    self.runner.run(&count_original_articles()).await?,
                );
            }
            MenuChoice::ArticlesBetween => {
                let Some(range) = prompter.ask_with(DATE_RANGE_PROMPT, parse_date_range)? else {
                    return Ok(None);
                };
                report.push(
                    "Matching articles are:",
                    self.runner.run(&articles_between(&range)).await?,
                );
            }
            MenuChoice::TopOrganization => {
                report.push(
                    "Most frequent organization:",
                    self.runner.run(&most_organization()).await?,
                );
            }
            MenuChoice::TopSection => {
                report.push(
                    "Section with most number of articles:",
                    self.runner.run(&most_section()).await?,
                );
            }
            MenuChoice::TypesOfMaterial => {
                report.push(
                    "Types of articles with their count:",
                    self.runner.run(&list_articles_type_of_materials()).await?,
                );
            }
            MenuChoice::BusiestMonth => {
                let output = self.runner.run(&highest_articles_month()).await?;
                report.summary = output.first().and_then(|row| {
                    let month = row.get_str("_id").ok()?;
                    let count = count_field(row, aggregate::COUNT)?;
                    Some(format!("{count} articles were published in {month}"))
                });
                report.push("Month with the most articles:", output);
            }
            MenuChoice::FrontPageArticles => {
                let Some(range) = prompter.ask_with(DATE_RANGE_PROMPT, parse_date_range)? else {
                    return Ok(None);
                };
                report.push(
                    "Matching articles are:",
                    self.runner.run(&front_page_articles(&range)).await?,
                );
            }
        }

        Ok(Some(report))
    }
}
