use std::collections::HashSet;
use tracing::trace;

use crate::domain::{FilterColumn, SurveyColumn};
use crate::table::Table;

/// Values picked in one multi-select, kept in pick order. Empty means no filter.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    values: Vec<String>,
}

impl Selection {
    #[cfg(test)]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sel = Selection::default();
        for v in values {
            let v = v.into();
            if !sel.contains(&v) {
                sel.values.push(v);
            }
        }
        sel
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_set(&self) -> bool {
        !self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Add the value if absent, remove it otherwise.
    pub fn toggle(&mut self, value: &str) {
        if let Some(pos) = self.values.iter().position(|v| v == value) {
            self.values.remove(pos);
        } else {
            self.values.push(value.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selections {
    pub constituency: Selection,
    pub occupation: Selection,
    pub age_group: Selection,
    pub gender: Selection,
}

impl Selections {
    pub fn get(&self, column: FilterColumn) -> &Selection {
        match column {
            FilterColumn::Constituency => &self.constituency,
            FilterColumn::Occupation => &self.occupation,
            FilterColumn::AgeGroup => &self.age_group,
            FilterColumn::Gender => &self.gender,
        }
    }

    pub fn get_mut(&mut self, column: FilterColumn) -> &mut Selection {
        match column {
            FilterColumn::Constituency => &mut self.constituency,
            FilterColumn::Occupation => &mut self.occupation,
            FilterColumn::AgeGroup => &mut self.age_group,
            FilterColumn::Gender => &mut self.gender,
        }
    }

    pub fn is_empty(&self) -> bool {
        FilterColumn::CASCADE.iter().all(|c| self.get(*c).is_empty())
    }

    pub fn clear(&mut self) {
        for c in FilterColumn::CASCADE {
            self.get_mut(c).clear();
        }
    }
}

/// Row sets after applying each filter in cascade order.
#[derive(Debug, Clone, PartialEq)]
pub struct Stages {
    pub constituency: Vec<usize>,
    pub occupation: Vec<usize>,
    pub age_group: Vec<usize>,
    pub gender: Vec<usize>,
}

impl Stages {
    /// Rows a filter draws its options from, i.e. the stage before it.
    pub fn input_of<'a>(&'a self, column: FilterColumn, all: &'a [usize]) -> &'a [usize] {
        match column {
            FilterColumn::Constituency => all,
            FilterColumn::Occupation => &self.constituency,
            FilterColumn::AgeGroup => &self.occupation,
            FilterColumn::Gender => &self.age_group,
        }
    }
}

/// Which view the resolution picked. Checked top to bottom, first hit wins,
/// and a Gender selection overrides all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Unfiltered,
    ConstituencyOnly,
    OccupationOnly,
    OccupationAndAge,
    ConstituencyAndAge,
    ConstituencyAndOccupation,
    AgeOnly,
    AllThree,
    GenderOverride,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub branch: Branch,
    pub stages: Stages,
    pub rows: Vec<usize>,
}

fn matches(table: &Table, column: SurveyColumn, row: usize, selection: &Selection) -> bool {
    table
        .value(column, row)
        .is_some_and(|v| selection.contains(v))
}

fn keep(table: &Table, rows: &[usize], column: SurveyColumn, selection: &Selection) -> Vec<usize> {
    rows.iter()
        .copied()
        .filter(|&r| matches(table, column, r, selection))
        .collect()
}

fn keep_if_set(
    table: &Table,
    rows: &[usize],
    column: SurveyColumn,
    selection: &Selection,
) -> Vec<usize> {
    if selection.is_empty() {
        rows.to_vec()
    } else {
        keep(table, rows, column, selection)
    }
}

pub fn stage(table: &Table, sel: &Selections) -> Stages {
    let all = table.all_rows();
    let constituency = keep_if_set(table, &all, SurveyColumn::Constituency, &sel.constituency);
    let occupation = keep_if_set(table, &constituency, SurveyColumn::Occupation, &sel.occupation);
    let age_group = keep_if_set(table, &occupation, SurveyColumn::AgeGroup, &sel.age_group);
    let gender = keep_if_set(table, &age_group, SurveyColumn::Gender, &sel.gender);
    Stages {
        constituency,
        occupation,
        age_group,
        gender,
    }
}

pub fn select_branch(sel: &Selections) -> Branch {
    let c = sel.constituency.is_set();
    let o = sel.occupation.is_set();
    let a = sel.age_group.is_set();
    let g = sel.gender.is_set();

    if g {
        Branch::GenderOverride
    } else if !c && !o && !a {
        Branch::Unfiltered
    } else if !o && !a {
        Branch::ConstituencyOnly
    } else if !c && !a {
        Branch::OccupationOnly
    } else if o && a {
        Branch::OccupationAndAge
    } else if c && a {
        Branch::ConstituencyAndAge
    } else if c && o {
        Branch::ConstituencyAndOccupation
    } else if a {
        Branch::AgeOnly
    } else {
        Branch::AllThree
    }
}

/// Resolve the four selections into the rows shown by the dashboard.
///
/// Filters are first staged one after another. The final view is then picked
/// from the branch list, where most branches re-filter either the full table
/// or the Occupation stage rather than reusing the last stage.
pub fn resolve(table: &Table, sel: &Selections) -> Resolution {
    let stages = stage(table, sel);
    let branch = select_branch(sel);
    let all = table.all_rows();

    let df3 = &stages.occupation;
    let by_constituency = |rows: &[usize]| {
        keep(table, rows, SurveyColumn::Constituency, &sel.constituency)
    };
    let by_occupation =
        |rows: &[usize]| keep(table, rows, SurveyColumn::Occupation, &sel.occupation);
    let by_age = |rows: &[usize]| keep(table, rows, SurveyColumn::AgeGroup, &sel.age_group);

    let rows = match branch {
        Branch::GenderOverride => stages.gender.clone(),
        Branch::Unfiltered => all,
        Branch::ConstituencyOnly => by_constituency(&all),
        Branch::OccupationOnly => by_occupation(&all),
        // The age condition does not restrict rows in this branch.
        Branch::OccupationAndAge => by_occupation(df3),
        Branch::ConstituencyAndAge => by_age(&by_constituency(df3)),
        Branch::ConstituencyAndOccupation => by_occupation(&by_constituency(df3)),
        Branch::AgeOnly => by_age(df3),
        Branch::AllThree => by_age(&by_occupation(&by_constituency(df3))),
    };

    trace!("Resolved {:?} => {} of {} rows", branch, rows.len(), table.len());
    Resolution {
        branch,
        stages,
        rows,
    }
}

/// Distinct non-null values of a column over the given rows, first seen first.
pub fn options(table: &Table, rows: &[usize], column: SurveyColumn) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut values = Vec::new();
    for &r in rows {
        if let Some(v) = table.value(column, r)
            && seen.insert(v)
        {
            values.push(v.to_string());
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{scenario_table, survey_table};

    fn names(table: &Table, rows: &[usize]) -> Vec<String> {
        rows.iter()
            .map(|&r| table.value(SurveyColumn::Name, r).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn no_selection_is_identity() {
        let table = survey_table();
        let res = resolve(&table, &Selections::default());
        assert_eq!(res.branch, Branch::Unfiltered);
        assert_eq!(res.rows, table.all_rows());
    }

    #[test]
    fn constituency_only_filters_full_table() {
        let table = survey_table();
        let sel = Selections {
            constituency: Selection::from_values(["Ranchi", "Dumka"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::ConstituencyOnly);
        let expected: Vec<usize> = table
            .all_rows()
            .into_iter()
            .filter(|&r| matches!(table.value(SurveyColumn::Constituency, r), Some("Ranchi") | Some("Dumka")))
            .collect();
        assert_eq!(res.rows, expected);
    }

    #[test]
    fn occupation_only_filters_full_table() {
        let table = survey_table();
        let sel = Selections {
            occupation: Selection::from_values(["Farmer"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::OccupationOnly);
        assert_eq!(names(&table, &res.rows), vec!["Asha", "Sunil", "Meena"]);
    }

    #[test]
    fn gender_always_wins() {
        let table = survey_table();
        let sel = Selections {
            constituency: Selection::from_values(["Ranchi"]),
            occupation: Selection::from_values(["Farmer", "Teacher"]),
            age_group: Selection::from_values(["18-25", "26-35"]),
            gender: Selection::from_values(["F"]),
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::GenderOverride);
        let expected: Vec<usize> = table
            .all_rows()
            .into_iter()
            .filter(|&r| {
                table.value(SurveyColumn::Constituency, r) == Some("Ranchi")
                    && matches!(table.value(SurveyColumn::Occupation, r), Some("Farmer") | Some("Teacher"))
                    && matches!(table.value(SurveyColumn::AgeGroup, r), Some("18-25") | Some("26-35"))
                    && table.value(SurveyColumn::Gender, r) == Some("F")
            })
            .collect();
        assert_eq!(res.rows, expected);
        assert_eq!(res.rows, res.stages.gender);
    }

    #[test]
    fn gender_alone_uses_staged_rows() {
        let table = scenario_table();
        let sel = Selections {
            gender: Selection::from_values(["F"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.rows, vec![1]);
    }

    #[test]
    fn occupation_and_age_ignores_age() {
        let table = survey_table();
        let sel = Selections {
            occupation: Selection::from_values(["Farmer"]),
            age_group: Selection::from_values(["46-60"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::OccupationAndAge);
        // Every farmer, whatever the age group.
        assert_eq!(names(&table, &res.rows), vec!["Asha", "Sunil", "Meena"]);
        assert_eq!(res.rows, res.stages.occupation);
        assert_ne!(res.rows, res.stages.age_group);
    }

    #[test]
    fn constituency_and_age_filters_occupation_stage() {
        let table = survey_table();
        let sel = Selections {
            constituency: Selection::from_values(["Ranchi"]),
            age_group: Selection::from_values(["18-25"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::ConstituencyAndAge);
        assert_eq!(names(&table, &res.rows), vec!["Asha", "Priya"]);
    }

    #[test]
    fn constituency_and_occupation() {
        let table = survey_table();
        let sel = Selections {
            constituency: Selection::from_values(["Ranchi"]),
            occupation: Selection::from_values(["Teacher"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::ConstituencyAndOccupation);
        assert_eq!(names(&table, &res.rows), vec!["Priya"]);
    }

    #[test]
    fn age_only() {
        let table = survey_table();
        let sel = Selections {
            age_group: Selection::from_values(["26-35"]),
            ..Default::default()
        };
        let res = resolve(&table, &sel);
        assert_eq!(res.branch, Branch::AgeOnly);
        assert_eq!(names(&table, &res.rows), vec!["Ravi", "Sunil"]);
    }

    #[test]
    fn branches_are_checked_in_order() {
        let c = Selection::from_values(["x"]);
        let sel = Selections {
            constituency: c.clone(),
            occupation: c.clone(),
            age_group: c.clone(),
            ..Default::default()
        };
        assert_eq!(select_branch(&sel), Branch::OccupationAndAge);
        let sel = Selections {
            gender: c,
            ..Default::default()
        };
        assert_eq!(select_branch(&sel), Branch::GenderOverride);
    }

    #[test]
    fn missing_values_never_match() {
        let table = survey_table();
        let sel = Selections {
            constituency: Selection::from_values([""]),
            ..Default::default()
        };
        assert!(resolve(&table, &sel).rows.is_empty());
    }

    #[test]
    fn stages_feed_options_in_cascade() {
        let table = survey_table();
        let sel = Selections {
            constituency: Selection::from_values(["Dumka"]),
            ..Default::default()
        };
        let stages = stage(&table, &sel);
        let all = table.all_rows();
        let occupations = options(
            &table,
            stages.input_of(FilterColumn::Occupation, &all),
            SurveyColumn::Occupation,
        );
        assert_eq!(occupations, vec!["Farmer", "Shopkeeper"]);
        let constituencies = options(
            &table,
            stages.input_of(FilterColumn::Constituency, &all),
            SurveyColumn::Constituency,
        );
        assert_eq!(constituencies, vec!["Ranchi", "Dhanbad", "Dumka"]);
    }

    #[test]
    fn selection_toggle_keeps_pick_order() {
        let mut sel = Selection::default();
        sel.toggle("b");
        sel.toggle("a");
        sel.toggle("b");
        sel.toggle("c");
        assert_eq!(sel.values(), &["a".to_string(), "c".to_string()]);
        assert_eq!(Selection::from_values(["a", "a", "c"]), sel);
    }
}
