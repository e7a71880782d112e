//! 目录的纯函数过滤与排序，不持有任何状态

use std::cmp::Ordering;
use std::fmt;
use crate::api::types::GameEntry;

/// 系统、模拟器下拉框里表示“不过滤”的哨兵值
pub const FILTER_ALL: &str = "all";

/// 目录过滤条件，三个条件取交集
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    /// 所属系统，FILTER_ALL 表示全部
    pub system: String,
    /// 模拟器 id，FILTER_ALL 表示全部
    pub emulator: String,
    /// 自由文本搜索，空串表示不搜索
    pub query: String,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            system: FILTER_ALL.to_string(),
            emulator: FILTER_ALL.to_string(),
            query: String::new(),
        }
    }
}

impl CatalogFilter {
    /// 单条记录是否通过过滤
    ///
    /// 系统和模拟器按原值精确匹配，搜索对标题、系统、模拟器名做
    /// 大小写不敏感的子串匹配
    pub fn matches(&self, entry: &GameEntry) -> bool {
        if self.system != FILTER_ALL && entry.game.system != self.system {
            return false;
        }

        if self.emulator != FILTER_ALL && entry.game.emulator_id != self.emulator {
            return false;
        }

        if self.query.is_empty() {
            return true;
        }

        let query = self.query.to_lowercase();
        entry.game.title.to_lowercase().contains(&query)
            || entry.game.system.to_lowercase().contains(&query)
            || entry.emulator.name.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Title,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// 排序方式，默认按标题升序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl CatalogSort {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// 轮换到下一种排序方式
    ///
    /// title-asc → title-desc → system-asc → system-desc → title-asc
    pub fn cycle(self) -> Self {
        match (self.key, self.direction) {
            (SortKey::Title, SortDirection::Ascending) => {
                Self::new(SortKey::Title, SortDirection::Descending)
            }
            (SortKey::Title, SortDirection::Descending) => {
                Self::new(SortKey::System, SortDirection::Ascending)
            }
            (SortKey::System, SortDirection::Ascending) => {
                Self::new(SortKey::System, SortDirection::Descending)
            }
            (SortKey::System, SortDirection::Descending) => {
                Self::new(SortKey::Title, SortDirection::Ascending)
            }
        }
    }

    fn compare(&self, a: &GameEntry, b: &GameEntry) -> Ordering {
        let (left, right) = match self.key {
            SortKey::Title => (&a.game.title, &b.game.title),
            SortKey::System => (&a.game.system, &b.game.system),
        };

        let ordering = left.to_lowercase().cmp(&right.to_lowercase());
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for CatalogSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            SortKey::Title => "title",
            SortKey::System => "system",
        };
        let direction = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };

        write!(f, "{}-{}", key, direction)
    }
}

/// 过滤并排序，返回新的列表，输入保持不变
///
/// 排序是稳定的，比较键相同的记录保持原有相对顺序
pub fn filter_and_sort(
    entries: &[GameEntry],
    filter: &CatalogFilter,
    sort: CatalogSort,
) -> Vec<GameEntry> {
    let mut result: Vec<GameEntry> = entries
        .iter()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect();
    result.sort_by(|a, b| sort.compare(a, b));

    result
}
