use lineage_data::Person;

/// Number of results returned when the caller has no preference
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<'a> {
    pub person: &'a Person,
    pub score: u32,
}

/// Find the persons whose name matches `query`, best first
///
/// Matching ignores case. Exact names rank first, then prefixes, then
/// substrings. Queries of three characters or more also match names one
/// edit away from their start. Ties are broken by full name.
pub fn search_persons<'a>(persons: &'a [Person], query: &str, limit: usize) -> Vec<SearchResult<'a>> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = persons
        .iter()
        .filter_map(|person| {
            let score = score(person, &query);
            (score > 0).then_some(SearchResult { person, score })
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| display_name(a.person).cmp(&display_name(b.person)))
    });
    results.truncate(limit);
    results
}

fn score(person: &Person, query: &str) -> u32 {
    let first = person.first_name.as_deref().unwrap_or_default().to_lowercase();
    let last = person.last_name.as_deref().unwrap_or_default().to_lowercase();
    let full = format!("{first} {last}");
    let full = full.trim();

    if first == query || last == query {
        100
    } else if first.starts_with(query) {
        90
    } else if last.starts_with(query) {
        85
    } else if full.starts_with(query) {
        80
    } else if first.contains(query) {
        60
    } else if last.contains(query) {
        55
    } else if full.contains(query) {
        50
    } else if query.chars().count() >= 3 {
        fuzzy(query, &first, &last)
    } else {
        0
    }
}

/// One edit away from the start of the first or last name
fn fuzzy(query: &str, first: &str, last: &str) -> u32 {
    let head = |name: &str| -> String { name.chars().take(query.chars().count() + 1).collect() };
    if levenshtein(query, &head(first)) <= 1 {
        40
    } else if levenshtein(query, &head(last)) <= 1 {
        35
    } else {
        0
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = substitution.min(row[j] + 1).min(diagonal + 1);
        }
    }
    row[b.len()]
}

fn display_name(person: &Person) -> String {
    let name = person.full_name();
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}
