//! The fixed question set.
//!
//! Each question is an independent, read-only query over the two tables.
//! Questions never depend on each other's answers, and a question whose
//! input is empty or degenerate answers `n/a` rather than failing.

use crate::analysis::aggregator::{
    difference_of_means, earliest_n, format_decimal, frequencies, is_weekend, join_list,
    max_group_mean, mode, nth_most_frequent, ols_slope, pearson, split_cohorts, tied_at_max,
    top_k_by, top_k_frequent,
};
use crate::models::{Finding, RepositoryRecord, UserRecord};
use crate::storage::Tables;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use tracing::debug;

/// Answer rendered when a question has no meaningful result.
pub const NOT_AVAILABLE: &str = "n/a";

/// Parameters shared by the questions.
#[derive(Debug, Clone)]
pub struct QuestionSettings {
    /// Case-insensitive substring matched against user locations. Empty
    /// matches everyone.
    pub location: String,
    /// Users created strictly after midnight UTC of this date form the
    /// "recent" cohort.
    pub cohort_cutoff: NaiveDate,
    /// Length of the ranked lists.
    pub top_n: usize,
}

impl Default for QuestionSettings {
    fn default() -> Self {
        Self {
            location: String::new(),
            cohort_cutoff: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            top_n: 5,
        }
    }
}

/// Answer every question against `tables`.
pub fn answer_all(tables: &Tables, settings: &QuestionSettings) -> Vec<Finding> {
    let users = &tables.users;
    let repos = &tables.repositories;
    let n = settings.top_n;

    let answers: Vec<(&str, String, Option<String>)> = vec![
        (
            "top_followers",
            format!("Top {n} users in '{}' by followers", settings.location),
            top_followers(users, &settings.location, n),
        ),
        (
            "earliest_users",
            format!("{n} earliest registered users"),
            earliest_users(users, n),
        ),
        (
            "popular_licenses",
            "3 most popular licenses".to_string(),
            popular_licenses(repos, 3),
        ),
        (
            "majority_company",
            "Company the most developers work at".to_string(),
            majority_company(users),
        ),
        (
            "popular_language",
            "Most popular repository language".to_string(),
            popular_language(repos),
        ),
        (
            "second_language_after_cutoff",
            format!(
                "Second most popular language among users who joined after {}",
                settings.cohort_cutoff
            ),
            second_language_after(users, repos, settings.cohort_cutoff),
        ),
        (
            "best_language_by_stars",
            "Language with the highest average stars per repository".to_string(),
            best_language_by_stars(repos),
        ),
        (
            "leader_strength",
            format!("Top {n} users by leader strength"),
            top_leader_strength(users, n),
        ),
        (
            "followers_repos_correlation",
            "Correlation between followers and public repositories".to_string(),
            followers_repos_correlation(users),
        ),
        (
            "followers_per_repo_slope",
            "Additional followers per additional public repository".to_string(),
            followers_per_repo_slope(users),
        ),
        (
            "projects_wiki_correlation",
            "Correlation between projects and wiki being enabled".to_string(),
            projects_wiki_correlation(repos),
        ),
        (
            "hireable_following_difference",
            "Average following of hireable users minus the rest".to_string(),
            hireable_following_difference(users),
        ),
        (
            "hireable_email_difference",
            "Share of hireable users with an email minus share of the rest".to_string(),
            hireable_email_difference(users),
        ),
        (
            "bio_length_slope",
            "Additional followers per additional bio word".to_string(),
            bio_length_slope(users),
        ),
        (
            "weekend_creators",
            format!("Top {n} users by repositories created on weekends"),
            weekend_creators(repos, n),
        ),
        (
            "common_surnames",
            "Most common surname(s)".to_string(),
            common_surnames(users),
        ),
    ];

    answers
        .into_iter()
        .map(|(key, question, answer)| {
            debug!("{} -> {:?}", key, answer);
            Finding {
                key: key.to_string(),
                question,
                answer: answer.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            }
        })
        .collect()
}

fn non_empty_list(items: Vec<String>) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(join_list(&items))
    }
}

fn logins<'a>(users: impl IntoIterator<Item = &'a UserRecord>) -> Vec<String> {
    users.into_iter().map(|u| u.login.clone()).collect()
}

/// Whether `user.location` contains `location`, ignoring case.
pub fn located_in(user: &UserRecord, location: &str) -> bool {
    user.location
        .to_lowercase()
        .contains(&location.trim().to_lowercase())
}

/// Whether the account was created strictly after midnight UTC of `cutoff`.
pub fn joined_after(user: &UserRecord, cutoff: NaiveDate) -> bool {
    let boundary: DateTime<Utc> = cutoff.and_time(chrono::NaiveTime::MIN).and_utc();
    user.created_at > boundary
}

pub fn top_followers(users: &[UserRecord], location: &str, n: usize) -> Option<String> {
    let top = top_k_by(
        users,
        |u| located_in(u, location),
        |u| f64::from(u.followers),
        n,
    );
    non_empty_list(logins(top))
}

pub fn earliest_users(users: &[UserRecord], n: usize) -> Option<String> {
    non_empty_list(logins(earliest_n(users, |u| u.created_at, n)))
}

pub fn popular_licenses(repos: &[RepositoryRecord], k: usize) -> Option<String> {
    non_empty_list(top_k_frequent(
        repos.iter().map(|r| r.license_name.as_str()),
        k,
    ))
}

pub fn majority_company(users: &[UserRecord]) -> Option<String> {
    mode(users.iter().map(|u| u.company.as_str()))
}

pub fn popular_language(repos: &[RepositoryRecord]) -> Option<String> {
    mode(repos.iter().map(|r| r.language.as_str()))
}

/// Second most frequent language among repositories of users who joined
/// after `cutoff`.
pub fn second_language_after(
    users: &[UserRecord],
    repos: &[RepositoryRecord],
    cutoff: NaiveDate,
) -> Option<String> {
    let (recent, _) = split_cohorts(users, |u| joined_after(u, cutoff));
    let recent: HashSet<&str> = recent.iter().map(|u| u.login.as_str()).collect();

    nth_most_frequent(
        repos
            .iter()
            .filter(|r| recent.contains(r.login.as_str()))
            .map(|r| r.language.as_str()),
        2,
    )
}

pub fn best_language_by_stars(repos: &[RepositoryRecord]) -> Option<String> {
    max_group_mean(
        repos
            .iter()
            .map(|r| (r.language.as_str(), r.stargazers_count as f64)),
    )
    .map(|(language, _)| language)
}

pub fn top_leader_strength(users: &[UserRecord], n: usize) -> Option<String> {
    let top = top_k_by(users, |_| true, UserRecord::leader_strength, n);
    non_empty_list(logins(top))
}

pub fn followers_repos_correlation(users: &[UserRecord]) -> Option<String> {
    let followers: Vec<f64> = users.iter().map(|u| f64::from(u.followers)).collect();
    let repos: Vec<f64> = users.iter().map(|u| f64::from(u.public_repos)).collect();
    pearson(&followers, &repos).map(format_decimal)
}

pub fn followers_per_repo_slope(users: &[UserRecord]) -> Option<String> {
    let repos: Vec<f64> = users.iter().map(|u| f64::from(u.public_repos)).collect();
    let followers: Vec<f64> = users.iter().map(|u| f64::from(u.followers)).collect();
    ols_slope(&repos, &followers).map(format_decimal)
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

pub fn projects_wiki_correlation(repos: &[RepositoryRecord]) -> Option<String> {
    let projects: Vec<f64> = repos.iter().map(|r| indicator(r.has_projects)).collect();
    let wiki: Vec<f64> = repos.iter().map(|r| indicator(r.has_wiki)).collect();
    pearson(&projects, &wiki).map(format_decimal)
}

pub fn hireable_following_difference(users: &[UserRecord]) -> Option<String> {
    let (hireable, rest) = split_cohorts(users, UserRecord::is_hireable);
    let following = |cohort: &[&UserRecord]| -> Vec<f64> {
        cohort.iter().map(|u| f64::from(u.following)).collect()
    };
    let (a, b) = (following(hireable.as_slice()), following(rest.as_slice()));
    difference_of_means(&a, &b).map(format_decimal)
}

pub fn hireable_email_difference(users: &[UserRecord]) -> Option<String> {
    let (hireable, rest) = split_cohorts(users, UserRecord::is_hireable);
    let has_email = |cohort: &[&UserRecord]| -> Vec<f64> {
        cohort.iter().map(|u| indicator(!u.email.is_empty())).collect()
    };
    let (a, b) = (has_email(hireable.as_slice()), has_email(rest.as_slice()));
    difference_of_means(&a, &b).map(format_decimal)
}

/// Regression of followers on bio word count, over users with a bio.
pub fn bio_length_slope(users: &[UserRecord]) -> Option<String> {
    let with_bio: Vec<&UserRecord> = users
        .iter()
        .filter(|u| !u.bio.trim().is_empty())
        .collect();
    let words: Vec<f64> = with_bio.iter().map(|u| u.bio_word_count() as f64).collect();
    let followers: Vec<f64> = with_bio.iter().map(|u| f64::from(u.followers)).collect();
    ols_slope(&words, &followers).map(format_decimal)
}

pub fn weekend_creators(repos: &[RepositoryRecord], n: usize) -> Option<String> {
    let ranked = frequencies(
        repos
            .iter()
            .filter(|r| is_weekend(&r.created_at))
            .map(|r| r.login.as_str()),
    );
    non_empty_list(ranked.into_iter().take(n).map(|(login, _)| login).collect())
}

pub fn common_surnames(users: &[UserRecord]) -> Option<String> {
    let ranked = frequencies(users.iter().filter_map(UserRecord::surname));
    non_empty_list(tied_at_max(&ranked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(login: &str, followers: u32, following: u32) -> UserRecord {
        UserRecord {
            login: login.to_string(),
            name: String::new(),
            company: String::new(),
            location: "Berlin, Germany".to_string(),
            email: String::new(),
            hireable: None,
            bio: String::new(),
            public_repos: 0,
            followers,
            following,
            created_at: Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn repo(login: &str, language: Option<&str>) -> RepositoryRecord {
        RepositoryRecord {
            login: login.to_string(),
            full_name: format!("{login}/project"),
            created_at: Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap(),
            stargazers_count: 0,
            watchers_count: 0,
            language: language.unwrap_or_default().to_string(),
            has_projects: true,
            has_wiki: true,
            license_name: String::new(),
        }
    }

    #[test]
    fn test_leader_strength_ranking() {
        let users = vec![user("a", 500, 10), user("b", 100, 0)];
        assert_eq!(top_leader_strength(&users, 5).as_deref(), Some("b,a"));
    }

    #[test]
    fn test_popular_language_excludes_missing() {
        let repos = vec![repo("x", Some("Go")), repo("x", Some("Go")), repo("x", None)];
        assert_eq!(popular_language(&repos).as_deref(), Some("Go"));
    }

    #[test]
    fn test_cohort_split_at_cutoff() {
        let mut early = user("early", 10, 0);
        early.created_at = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        let mut late = user("late", 10, 0);
        late.created_at = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        let cutoff = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        let users = vec![early, late];
        let (after, before) = split_cohorts(&users, |u| joined_after(u, cutoff));

        assert_eq!(logins(after), vec!["late"]);
        assert_eq!(logins(before), vec!["early"]);
    }

    #[test]
    fn test_second_language_after_cutoff() {
        let mut early = user("early", 10, 0);
        early.created_at = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
        let mut late = user("late", 10, 0);
        late.created_at = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();

        let repos = vec![
            repo("early", Some("Java")),
            repo("early", Some("Java")),
            repo("early", Some("Java")),
            repo("late", Some("Rust")),
            repo("late", Some("Rust")),
            repo("late", Some("Go")),
        ];
        let cutoff = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        assert_eq!(
            second_language_after(&[early, late], &repos, cutoff).as_deref(),
            Some("Go")
        );
    }

    #[test]
    fn test_top_followers_filters_location_case_insensitively() {
        let mut elsewhere = user("far", 10_000, 0);
        elsewhere.location = "Paris".to_string();
        let users = vec![user("low", 10, 0), elsewhere, user("high", 900, 0), user("mid", 300, 0)];

        assert_eq!(
            top_followers(&users, "berlin", 2).as_deref(),
            Some("high,mid")
        );
        assert_eq!(top_followers(&users, "Tokyo", 2), None);
    }

    #[test]
    fn test_earliest_users() {
        let mut a = user("a", 1, 0);
        a.created_at = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        let mut b = user("b", 1, 0);
        b.created_at = Utc.with_ymd_and_hms(2008, 1, 1, 0, 0, 0).unwrap();
        let c = user("c", 1, 0);

        assert_eq!(earliest_users(&[a, b, c], 2).as_deref(), Some("b,a"));
    }

    #[test]
    fn test_majority_company_skips_blank() {
        let mut a = user("a", 1, 0);
        a.company = "ACME".to_string();
        let b = user("b", 1, 0);
        let c = user("c", 1, 0);

        assert_eq!(majority_company(&[a, b, c]).as_deref(), Some("ACME"));
    }

    #[test]
    fn test_best_language_by_stars() {
        let mut rust = repo("a", Some("Rust"));
        rust.stargazers_count = 50;
        let mut go = repo("a", Some("Go"));
        go.stargazers_count = 10;
        let mut go2 = repo("b", Some("Go"));
        go2.stargazers_count = 100;

        assert_eq!(
            best_language_by_stars(&[rust, go, go2]).as_deref(),
            Some("Go")
        );
    }

    #[test]
    fn test_followers_statistics_on_two_users() {
        let mut a = user("a", 100, 0);
        a.public_repos = 10;
        let mut b = user("b", 300, 0);
        b.public_repos = 20;
        let users = vec![a, b];

        assert_eq!(followers_repos_correlation(&users).as_deref(), Some("1.000"));
        assert_eq!(followers_per_repo_slope(&users).as_deref(), Some("20.000"));
    }

    #[test]
    fn test_hireable_differences_treat_unknown_as_not_hireable() {
        let mut yes = user("yes", 1, 30);
        yes.hireable = Some(true);
        yes.email = "yes@example.com".to_string();
        let mut no = user("no", 1, 10);
        no.hireable = Some(false);
        let unknown = user("unknown", 1, 20);
        let users = vec![yes, no, unknown];

        assert_eq!(
            hireable_following_difference(&users).as_deref(),
            Some("15.000")
        );
        assert_eq!(hireable_email_difference(&users).as_deref(), Some("1.000"));
    }

    #[test]
    fn test_bio_length_slope_ignores_empty_bios() {
        let mut short = user("short", 100, 0);
        short.bio = "Rust dev".to_string();
        let mut long = user("long", 400, 0);
        long.bio = "Builds compilers and databases".to_string();
        let silent = user("silent", 10_000, 0);

        assert_eq!(
            bio_length_slope(&[short, long, silent]).as_deref(),
            Some("150.000")
        );
    }

    #[test]
    fn test_weekend_creators() {
        let mut sat = repo("sam", None);
        sat.created_at = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();
        let mut sun = repo("sam", None);
        sun.created_at = Utc.with_ymd_and_hms(2024, 3, 10, 10, 0, 0).unwrap();
        let mut sun2 = repo("kai", None);
        sun2.created_at = Utc.with_ymd_and_hms(2024, 3, 17, 10, 0, 0).unwrap();
        let weekday = repo("wes", None);

        assert_eq!(
            weekend_creators(&[sat, sun, sun2, weekday], 5).as_deref(),
            Some("sam,kai")
        );
    }

    #[test]
    fn test_common_surnames_reports_all_ties() {
        let names = ["Ada Lovelace", "Alan Turing", "Byron Lovelace", "Joan Turing", "Solo", ""];
        let users: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut u = user(&format!("u{i}"), 1, 0);
                u.name = name.to_string();
                u
            })
            .collect();

        assert_eq!(common_surnames(&users).as_deref(), Some("Lovelace,Turing"));
    }

    #[test]
    fn test_answer_all_tolerates_empty_tables() {
        let findings = answer_all(&Tables::default(), &QuestionSettings::default());

        assert_eq!(findings.len(), 16);
        assert!(findings.iter().all(|f| f.answer == NOT_AVAILABLE));
    }

    #[test]
    fn test_answer_all_is_idempotent() {
        let tables = Tables {
            users: vec![user("a", 500, 10), user("b", 100, 0), user("c", 100, 0)],
            repositories: vec![repo("a", Some("Go")), repo("b", Some("Rust"))],
        };
        let settings = QuestionSettings {
            location: "Berlin".to_string(),
            ..QuestionSettings::default()
        };

        let first = answer_all(&tables, &settings);
        let second = answer_all(&tables, &settings);
        let answers = |f: &[Finding]| f.iter().map(|x| x.answer.clone()).collect::<Vec<_>>();

        assert_eq!(answers(first.as_slice()), answers(second.as_slice()));
        assert_eq!(first[0].key, "top_followers");
        assert_eq!(first[0].answer, "a,b,c");
    }
}
