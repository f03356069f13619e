// SPDX-License-Identifier: MPL-2.0

//! Achievement catalog, user-owned achievements and their progress.
//!
//! A user-owned achievement is `Active` while `current < target` and
//! `Completed` afterwards. Completion is terminal: no progress update can
//! move an achievement back to `Active`.

use crate::api::{Achievement, CatalogEntry, Category, NewAchievement};
use crate::cache::ValidationError;
use crate::cache::index::{IndexedList, Placement, Upsert};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    Active,
    Completed,
}

impl Achievement {
    pub fn state(&self) -> ProgressState {
        if self.completed {
            ProgressState::Completed
        } else {
            ProgressState::Active
        }
    }

    /// Set progress, clamped to `[0, target]`. Reaching the target
    /// completes the achievement. No-op once completed.
    pub fn set_progress(&mut self, value: i64) -> ProgressState {
        if self.completed {
            return ProgressState::Completed;
        }

        let clamped = value.clamp(0, i64::from(self.target));
        if clamped >= i64::from(self.target) {
            self.complete();
        } else {
            self.current = clamped as u32;
        }
        self.state()
    }

    pub fn increment(&mut self) -> ProgressState {
        if self.completed {
            return ProgressState::Completed;
        }
        self.set_progress(i64::from(self.current) + 1)
    }

    /// Mark done regardless of progress
    pub fn complete(&mut self) {
        self.current = self.target;
        self.completed = true;
    }

    /// Fraction of the target reached, in `[0, 1]`
    pub fn ratio(&self) -> f64 {
        f64::from(self.current) / f64::from(self.target.max(1))
    }

    /// Repair records from outside the state machine (local storage, the
    /// server): target at least 1, current within range, completion
    /// implied by a full progress bar.
    pub fn normalize(&mut self) {
        self.target = self.target.max(1);
        if self.completed || self.current >= self.target {
            self.complete();
        }
    }

    /// A fresh local achievement built from a validated draft
    pub fn from_draft(draft: NewAchievement, id: String, now: DateTime<Utc>) -> Self {
        let mut achievement = Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            icon: draft.icon,
            target: draft.target,
            current: 0,
            completed: false,
            created_at: now,
        };
        achievement.normalize();
        achievement
    }

    /// Payload for creating this achievement on the server
    pub fn to_payload(&self) -> NewAchievement {
        NewAchievement {
            title: self.title.clone(),
            description: self.description.clone(),
            target: self.target,
            current: self.current,
            category: self.category,
            icon: self.icon.clone(),
        }
    }
}

/// Id for an achievement created on this device, before the server has
/// assigned one
pub fn new_local_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4())
}

pub fn is_local_id(id: &str) -> bool {
    id.starts_with("user-")
}

/// Fields a user may change when adopting a catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub icon: Option<String>,
    pub target: Option<u32>,
}

/// Merge a catalog entry with overrides and validate the result.
pub fn draft_from_catalog(
    entry: &CatalogEntry,
    overrides: Overrides,
) -> Result<NewAchievement, ValidationError> {
    validate_draft(
        overrides.title.unwrap_or_else(|| entry.title.clone()),
        overrides
            .description
            .unwrap_or_else(|| entry.description.clone()),
        overrides.target.unwrap_or(entry.target),
        overrides.category.unwrap_or_else(|| entry.category()),
        overrides.icon.or_else(|| entry.icon.clone()),
    )
}

/// Validate a custom achievement form. A missing icon falls back to the
/// category's icon.
pub fn validate_draft(
    title: String,
    description: String,
    target: u32,
    category: Category,
    icon: Option<String>,
) -> Result<NewAchievement, ValidationError> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if target == 0 {
        return Err(ValidationError::NonPositiveTarget);
    }

    let icon = icon
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| category.default_icon().to_string());

    Ok(NewAchievement {
        title,
        description: description.trim().to_string(),
        target,
        current: 0,
        category,
        icon,
    })
}

/// Category selector for derived views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .map(CategoryFilter::Only)
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(category) => f.write_str(category.as_str()),
        }
    }
}

/// Anything that can be filtered by category
pub trait Categorized {
    fn category(&self) -> Category;
}

impl Categorized for Achievement {
    fn category(&self) -> Category {
        self.category
    }
}

impl Categorized for CatalogEntry {
    fn category(&self) -> Category {
        CatalogEntry::category(self)
    }
}

/// Derived view: the records matching `filter`, in their stored order
pub fn filter_by_category<'a, T, I>(records: I, filter: CategoryFilter) -> Vec<&'a T>
where
    T: Categorized + 'a,
    I: IntoIterator<Item = &'a T>,
{
    records
        .into_iter()
        .filter(|record| filter.matches(record.category()))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AchievementStats {
    pub total: usize,
    pub completed: usize,
    /// Rounded completion percentage, 0 when there is nothing tracked
    pub percent: u8,
}

/// The catalog plus the user's own achievements.
#[derive(Debug, Clone, Default)]
pub struct AchievementStore {
    catalog: Vec<CatalogEntry>,
    owned: IndexedList<Achievement>,
}

impl AchievementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &[CatalogEntry] {
        &self.catalog
    }

    pub fn set_catalog(&mut self, entries: Vec<CatalogEntry>) {
        self.catalog = entries;
    }

    pub fn owned(&self) -> impl Iterator<Item = &Achievement> {
        self.owned.iter()
    }

    pub fn owned_snapshot(&self) -> Vec<Achievement> {
        self.owned.to_vec()
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.owned.get(id)
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Replace the owned collection, e.g. when restoring from disk
    pub fn restore(&mut self, achievements: Vec<Achievement>) {
        self.owned = IndexedList::from_records(achievements.into_iter().map(|mut a| {
            a.normalize();
            a
        }));
    }

    /// Append a new achievement, or replace one with the same id in place.
    /// A replacement never lowers progress or undoes completion; only
    /// [`AchievementStore::remove`] can reset an achievement.
    pub fn add(&mut self, mut achievement: Achievement) -> Upsert {
        if let Some(existing) = self.owned.get(&achievement.id) {
            achievement.current = achievement.current.max(existing.current);
            achievement.completed |= existing.completed;
        }
        achievement.normalize();
        self.owned.upsert(achievement, Placement::Tail)
    }

    pub fn set_progress(&mut self, id: &str, value: i64) -> Option<ProgressState> {
        self.owned.update(id, |a| a.set_progress(value))
    }

    pub fn increment(&mut self, id: &str) -> Option<ProgressState> {
        self.owned.update(id, Achievement::increment)
    }

    pub fn complete(&mut self, id: &str) -> Option<ProgressState> {
        self.owned.update(id, |a| {
            a.complete();
            a.state()
        })
    }

    pub fn remove(&mut self, id: &str) -> Option<Achievement> {
        self.owned.remove(id)
    }

    /// Swap a locally created achievement for the server's copy, keeping
    /// the local position and any progress made while the request was in
    /// flight. Returns false when `local_id` is no longer present.
    pub fn reconcile(&mut self, local_id: &str, mut server: Achievement) -> bool {
        let Some(local) = self.owned.get(local_id) else {
            return false;
        };

        server.current = server.current.max(local.current);
        server.completed |= local.completed;
        server.normalize();
        self.owned.replace_keyed(local_id, server)
    }

    pub fn filtered(&self, filter: CategoryFilter) -> Vec<&Achievement> {
        filter_by_category(self.owned.iter(), filter)
    }

    pub fn filtered_catalog(&self, filter: CategoryFilter) -> Vec<&CatalogEntry> {
        filter_by_category(self.catalog.iter(), filter)
    }

    pub fn stats(&self) -> AchievementStats {
        let total = self.owned.len();
        let completed = self.owned.iter().filter(|a| a.completed).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };

        AchievementStats {
            total,
            completed,
            percent,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.owned.is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn achievement(id: &str, target: u32, current: u32) -> Achievement {
        Achievement {
            id: id.to_string(),
            title: format!("goal {id}"),
            description: String::new(),
            category: Category::Sport,
            icon: "🏆".to_string(),
            target,
            current,
            completed: false,
            created_at: Utc::now(),
        }
    }

    fn entry(title: &str, category: Option<Category>) -> CatalogEntry {
        CatalogEntry {
            id: None,
            title: title.to_string(),
            description: "from catalog".to_string(),
            category,
            icon: None,
            target: 30,
        }
    }

    #[test]
    fn test_increment_clamps_at_target() {
        let mut a = achievement("a", 100, 95);
        for _ in 0..10 {
            a.increment();
        }
        assert_eq!(a.current, 100);
        assert!(a.completed);
    }

    #[test]
    fn test_set_progress_clamps_both_ends() {
        let mut a = achievement("a", 10, 5);
        assert_eq!(a.set_progress(-4), ProgressState::Active);
        assert_eq!(a.current, 0);

        assert_eq!(a.set_progress(42), ProgressState::Completed);
        assert_eq!(a.current, 10);
    }

    #[test]
    fn test_completion_is_terminal() {
        let mut a = achievement("a", 3, 0);
        a.set_progress(3);
        assert_eq!(a.set_progress(1), ProgressState::Completed);
        assert_eq!(a.current, 3);
        assert!(a.completed);
    }

    #[test]
    fn test_complete_forces_target() {
        let mut a = achievement("a", 7, 2);
        a.complete();
        assert_eq!((a.current, a.completed), (7, true));
    }

    #[test]
    fn test_ratio() {
        let mut a = achievement("a", 4, 1);
        assert_eq!(a.ratio(), 0.25);
        a.complete();
        assert_eq!(a.ratio(), 1.0);
    }

    #[test]
    fn test_normalize_repairs_bad_records() {
        let mut a = achievement("a", 0, 4);
        a.normalize();
        assert_eq!((a.target, a.current, a.completed), (1, 1, true));

        let mut b = achievement("b", 5, 2);
        b.completed = true;
        b.normalize();
        assert_eq!(b.current, 5);
    }

    #[test]
    fn test_draft_from_catalog_with_overrides() {
        let draft = draft_from_catalog(
            &entry("Yoga", Some(Category::Health)),
            Overrides {
                target: Some(10),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(draft.title, "Yoga");
        assert_eq!(draft.description, "from catalog");
        assert_eq!(draft.target, 10);
        assert_eq!(draft.category, Category::Health);
        assert_eq!(draft.icon, Category::Health.default_icon());

        let a = Achievement::from_draft(draft, new_local_id(), Utc::now());
        assert!(is_local_id(&a.id));
        assert_eq!((a.current, a.completed), (0, false));
    }

    #[test]
    fn test_validate_draft_rejects_bad_input() {
        assert_eq!(
            validate_draft(" ".into(), String::new(), 5, Category::Other, None),
            Err(ValidationError::EmptyTitle)
        );
        assert_eq!(
            validate_draft("Run".into(), String::new(), 0, Category::Sport, None),
            Err(ValidationError::NonPositiveTarget)
        );
    }

    #[test]
    fn test_local_ids_are_unique() {
        assert_ne!(new_local_id(), new_local_id());
    }

    #[test]
    fn test_category_filter_parsing() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Learning".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Learning)
        );
        assert!("fitness".parse::<CategoryFilter>().is_err());
        assert_eq!(CategoryFilter::Only(Category::Sport).to_string(), "sport");
    }

    #[test]
    fn test_filter_is_a_view() {
        let mut store = AchievementStore::new();
        let mut learning = achievement("b", 1, 0);
        learning.category = Category::Learning;
        store.add(achievement("a", 1, 0));
        store.add(learning);
        store.set_catalog(vec![
            entry("Run", Some(Category::Sport)),
            entry("Paint", Some(Category::Creativity)),
        ]);

        let sport: Vec<_> = store
            .filtered(CategoryFilter::Only(Category::Sport))
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(sport, vec!["a"]);
        assert_eq!(store.filtered(CategoryFilter::All).len(), 2);
        assert_eq!(
            store
                .filtered_catalog(CategoryFilter::Only(Category::Creativity))
                .len(),
            1
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_progress_and_removal() {
        let mut store = AchievementStore::new();
        store.add(achievement("a", 2, 0));

        assert_eq!(store.increment("a"), Some(ProgressState::Active));
        assert_eq!(store.increment("a"), Some(ProgressState::Completed));
        assert_eq!(store.increment("missing"), None);

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reconcile_keeps_position_and_progress() {
        let mut store = AchievementStore::new();
        store.add(achievement("first", 5, 0));
        store.add(achievement("user-1", 5, 0));
        store.add(achievement("last", 5, 0));
        store.set_progress("user-1", 3);

        let server = achievement("srv-9", 5, 0);
        assert!(store.reconcile("user-1", server));

        let ids: Vec<_> = store.owned().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "srv-9", "last"]);
        assert_eq!(store.get("srv-9").unwrap().current, 3);
        assert!(!store.reconcile("user-1", achievement("srv-10", 5, 0)));
        assert!(store.is_consistent());
    }

    #[test]
    fn test_stats() {
        let mut store = AchievementStore::new();
        assert_eq!(store.stats(), AchievementStats::default());

        store.add(achievement("a", 1, 0));
        store.add(achievement("b", 1, 0));
        store.add(achievement("c", 1, 0));
        store.complete("a");

        assert_eq!(
            store.stats(),
            AchievementStats {
                total: 3,
                completed: 1,
                percent: 33
            }
        );
    }
}
