use url::Url;

/// Highest number of qualities a room can advertise; priorities run from 0
/// down to `i8::MIN`.
pub const MAX_QUALITIES: usize = (i8::MAX as usize) + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    /// Canonical room id, never the alias the caller looked up.
    pub id: String,
    pub title: String,
    pub is_online: bool,
    pub cover_url: Url,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub name: String,
    pub avatar_url: Url,
}

/// A selectable stream quality. Higher `priority` is more preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quality {
    pub id: String,
    pub name: String,
    pub priority: i8,
}

impl Quality {
    /// Builds qualities from `(id, name)` pairs in preference order, assigning
    /// priorities 0, -1, -2, ... Entries past [`MAX_QUALITIES`] are dropped.
    pub fn ranked<I>(offered: I) -> Vec<Quality>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        offered
            .into_iter()
            .zip(0i16..)
            .take(MAX_QUALITIES)
            .map(|((id, name), rank)| Quality {
                id,
                name,
                priority: (-rank) as i8,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ranked_assigns_decreasing_priorities() {
        let qs = Quality::ranked(vec![
            ("10000".to_string(), "原画".to_string()),
            ("400".to_string(), "蓝光".to_string()),
        ]);
        assert_eq!(qs[0].priority, 0);
        assert_eq!(qs[1].priority, -1);
        assert_eq!(qs[1].name, "蓝光");
    }

    #[test]
    fn test_ranked_caps_at_i8_range() {
        let offered = (0..300).map(|i| (i.to_string(), "q".to_string()));
        let qs = Quality::ranked(offered);
        assert_eq!(qs.len(), MAX_QUALITIES);
        assert_eq!(qs.last().map(|q| q.priority), Some(i8::MIN));
    }

    proptest! {
        #[test]
        fn prop_priorities_strictly_decreasing(ids in proptest::collection::vec(any::<u32>(), 0..200)) {
            let qs = Quality::ranked(ids.iter().map(|id| (id.to_string(), String::new())));
            for pair in qs.windows(2) {
                prop_assert!(pair[0].priority > pair[1].priority);
            }
            if let Some(first) = qs.first() {
                prop_assert_eq!(first.priority, 0);
            }
        }
    }
}
