/// Resource names accepted on the command line, and lookup logic

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
  Profile,
  Grades,
  AggregateScore,
  TrainingScores,
  ExamSchedule,
  WeekSchedule,
  Feedback,
  Account,
}

#[derive(Debug, Clone)]
pub struct ResourceInfo {
  pub kind: ResourceKind,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub description: &'static str,
  /// Whether offline search is supported
  pub searchable: bool,
}

/// All available resources
pub const RESOURCES: &[ResourceInfo] = &[
  ResourceInfo {
    kind: ResourceKind::Profile,
    name: "profile",
    aliases: &["p", "me", "student"],
    description: "Student profile",
    searchable: false,
  },
  ResourceInfo {
    kind: ResourceKind::Grades,
    name: "grades",
    aliases: &["g", "results", "marks"],
    description: "Course results",
    searchable: true,
  },
  ResourceInfo {
    kind: ResourceKind::AggregateScore,
    name: "gpa",
    aliases: &["score", "summary", "aggregate"],
    description: "Cumulative GPA summary",
    searchable: false,
  },
  ResourceInfo {
    kind: ResourceKind::TrainingScores,
    name: "training",
    aliases: &["t", "conduct"],
    description: "Training (conduct) scores per semester",
    searchable: true,
  },
  ResourceInfo {
    kind: ResourceKind::ExamSchedule,
    name: "exams",
    aliases: &["e", "exam"],
    description: "Exam schedule",
    searchable: true,
  },
  ResourceInfo {
    kind: ResourceKind::WeekSchedule,
    name: "week",
    aliases: &["w", "timetable", "schedule"],
    description: "Timetable for one week (requires --week)",
    searchable: false,
  },
  ResourceInfo {
    kind: ResourceKind::Feedback,
    name: "feedback",
    aliases: &["f", "messages"],
    description: "Feedback and notices",
    searchable: true,
  },
  ResourceInfo {
    kind: ResourceKind::Account,
    name: "account",
    aliases: &["a", "user"],
    description: "Login account",
    searchable: false,
  },
];

impl ResourceKind {
  pub fn info(self) -> &'static ResourceInfo {
    RESOURCES
      .iter()
      .find(|r| r.kind == self)
      .unwrap_or(&RESOURCES[0])
  }
}

/// Resolve a name or alias. Only exact matches count.
pub fn lookup(input: &str) -> Option<ResourceKind> {
  let input_lower = input.trim().to_lowercase();
  RESOURCES
    .iter()
    .find(|r| r.name == input_lower || r.aliases.contains(&input_lower.as_str()))
    .map(|r| r.kind)
}

/// Get suggestions for a given input, best match first
pub fn get_suggestions(input: &str) -> Vec<&'static ResourceInfo> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return RESOURCES.iter().collect();
  }

  let mut matches: Vec<(&ResourceInfo, u32)> = Vec::new();

  for res in RESOURCES {
    // Exact match on name
    if res.name == input_lower {
      matches.push((res, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if res.aliases.contains(&input_lower.as_str()) {
      matches.push((res, 1));
      continue;
    }

    // Prefix match on name
    if res.name.starts_with(&input_lower) {
      matches.push((res, 2));
      continue;
    }

    // Prefix match on alias
    if res.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((res, 3));
      continue;
    }

    // Fuzzy match (contains)
    if res.name.contains(&input_lower) {
      matches.push((res, 4));
      continue;
    }

    // Fuzzy match on alias
    if res.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((res, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(res, _)| res).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_input_returns_all() {
    let suggestions = get_suggestions("");
    assert_eq!(suggestions.len(), RESOURCES.len());
  }

  #[test]
  fn test_lookup_name_and_alias() {
    assert_eq!(lookup("grades"), Some(ResourceKind::Grades));
    assert_eq!(lookup(" G "), Some(ResourceKind::Grades));
    assert_eq!(lookup("timetable"), Some(ResourceKind::WeekSchedule));
    assert_eq!(lookup("gra"), None);
  }

  #[test]
  fn test_prefix_match() {
    let suggestions = get_suggestions("gra");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "grades");
  }

  #[test]
  fn test_fuzzy_match() {
    let suggestions = get_suggestions("xam");
    assert!(!suggestions.is_empty());
    assert_eq!(suggestions[0].name, "exams");
  }

  #[test]
  fn test_every_kind_has_info() {
    for res in RESOURCES {
      assert_eq!(res.kind.info().name, res.name);
    }
  }
}
