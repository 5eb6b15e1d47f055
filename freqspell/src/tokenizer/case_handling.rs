use smol_str::SmolStr;

#[inline(always)]
pub fn lower_case(s: &str) -> SmolStr {
    s.chars()
        .map(|c| c.to_lowercase().collect::<String>())
        .collect::<SmolStr>()
}

#[inline(always)]
pub fn upper_case(s: &str) -> SmolStr {
    s.chars()
        .map(|c| c.to_uppercase().collect::<String>())
        .collect::<SmolStr>()
}

#[inline(always)]
pub fn upper_first(s: &str) -> SmolStr {
    let mut c = s.chars();
    match c.next() {
        None => SmolStr::new(""),
        Some(f) => SmolStr::from(f.to_uppercase().collect::<String>() + c.as_str()),
    }
}

pub fn is_all_caps(word: &str) -> bool {
    upper_case(word) == word && lower_case(word) != word
}

pub fn is_first_caps(word: &str) -> bool {
    upper_first(word) == word && lower_case(word) != word
}

/// Casing of a query that is carried over to its suggestions when the
/// engine matches case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMutation {
    FirstCaps,
    AllCaps,
    None,
}

impl CaseMutation {
    pub fn of(word: &str) -> CaseMutation {
        // A single capital letter reads as first-caps, not all-caps.
        if word.chars().count() > 1 && is_all_caps(word) {
            CaseMutation::AllCaps
        } else if is_first_caps(word) {
            CaseMutation::FirstCaps
        } else {
            CaseMutation::None
        }
    }

    pub fn apply(self, word: &str) -> SmolStr {
        match self {
            CaseMutation::FirstCaps => upper_first(word),
            CaseMutation::AllCaps => upper_case(word),
            CaseMutation::None => SmolStr::new(word),
        }
    }
}
