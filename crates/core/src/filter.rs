use crate::models::{CandidateProfile, FilterSpec};

/// Profiles passing every predicate of `spec`, in their original order.
pub fn filter_profiles<'a, I>(profiles: I, spec: &FilterSpec) -> Vec<CandidateProfile>
where
    I: IntoIterator<Item = &'a CandidateProfile>,
{
    profiles
        .into_iter()
        .filter(|profile| matches_spec(profile, spec))
        .cloned()
        .collect()
}

pub fn matches_spec(profile: &CandidateProfile, spec: &FilterSpec) -> bool {
    contains_ignoring_case(profile.applied_for.as_deref(), &spec.job)
        && contains_ignoring_case(profile.governorate.as_deref(), &spec.governorate)
        && matches_age(profile.age, &spec.age)
}

fn contains_ignoring_case(value: Option<&str>, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    value
        .unwrap_or_default()
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// `"25-30"` is an inclusive range where an unparseable side is open, `"30"` an
/// exact age and an unparseable value applies no constraint. Any non-empty filter
/// excludes profiles without an age.
fn matches_age(age: Option<u32>, filter: &str) -> bool {
    let filter = filter.trim();
    if filter.is_empty() {
        return true;
    }
    let Some(age) = age.map(i64::from) else {
        return false;
    };

    match filter.split_once('-') {
        Some((min, max)) => {
            let min = min.trim().parse::<i64>().ok();
            let max = max.trim().parse::<i64>().ok();
            min.map_or(true, |min| age >= min) && max.map_or(true, |max| age <= max)
        }
        None => filter.parse::<i64>().map_or(true, |exact| age == exact),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pdf;

    fn profile(id: &str, applied_for: Option<&str>, governorate: Option<&str>, age: Option<u32>) -> CandidateProfile {
        CandidateProfile {
            id: id.to_string(),
            name: Some(id.to_string()),
            email: None,
            phone: None,
            age,
            governorate: governorate.map(str::to_string),
            applied_for: applied_for.map(str::to_string),
            skills: Vec::new(),
            experience_summary: String::new(),
            match_score: None,
            source_document: pdf("cv.pdf"),
        }
    }

    fn age_spec(age: &str) -> FilterSpec {
        FilterSpec {
            age: age.to_string(),
            ..FilterSpec::default()
        }
    }

    fn ids(profiles: &[CandidateProfile]) -> Vec<&str> {
        profiles.iter().map(|profile| profile.id.as_str()).collect()
    }

    fn aged() -> Vec<CandidateProfile> {
        [24, 25, 30, 31]
            .into_iter()
            .map(|age| profile(&age.to_string(), None, None, Some(age)))
            .collect()
    }

    #[test]
    fn empty_spec_keeps_everything_in_order() {
        let profiles = vec![
            profile("a", None, None, None),
            profile("b", Some("Accountant"), Some("Cairo"), Some(40)),
        ];
        assert_eq!(ids(&filter_profiles(&profiles, &FilterSpec::default())), vec!["a", "b"]);
    }

    #[test]
    fn job_and_governorate_are_case_insensitive_substrings() {
        let profiles = vec![
            profile("a", Some("Senior Backend Engineer"), Some("Alexandria"), None),
            profile("b", Some("Sales"), Some("Cairo"), None),
            profile("c", None, Some("alexandria"), None),
        ];
        let spec = FilterSpec {
            job: "backend".to_string(),
            governorate: "ALEX".to_string(),
            age: String::new(),
        };
        assert_eq!(ids(&filter_profiles(&profiles, &spec)), vec!["a"]);

        let spec = FilterSpec {
            governorate: "alex".to_string(),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_profiles(&profiles, &spec)), vec!["a", "c"]);
    }

    #[test]
    fn range_is_inclusive() {
        let profiles = aged();
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("25-30"))), vec!["25", "30"]);
    }

    #[test]
    fn unparseable_range_side_is_open() {
        let profiles = aged();
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("30-"))), vec!["30", "31"]);
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("-25"))), vec!["24", "25"]);
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("x-y"))).len(), 4);
    }

    #[test]
    fn exact_and_unparseable_ages() {
        let profiles = aged();
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("31"))), vec!["31"]);
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("abc"))).len(), 4);
    }

    #[test]
    fn age_filter_excludes_profiles_without_age() {
        let profiles = vec![profile("none", None, None, None), profile("old", None, None, Some(50))];
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("abc"))), vec!["old"]);
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec("40-"))), vec!["old"]);
        assert_eq!(ids(&filter_profiles(&profiles, &age_spec(""))), vec!["none", "old"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let mut profiles = aged();
        profiles.push(profile("x", Some("Go developer"), Some("Giza"), None));
        let spec = FilterSpec {
            job: "go".to_string(),
            governorate: String::new(),
            age: String::new(),
        };

        let first = filter_profiles(&profiles, &spec);
        let second = filter_profiles(&profiles, &spec);

        assert_eq!(ids(&first), ids(&second));
    }
}
