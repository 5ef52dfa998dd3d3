use crate::domain::model::{Member, UNKNOWN_MEMBER_LABEL};
use std::collections::HashMap;

/// Id to display-name lookup over a fixed member list.
#[derive(Debug, Clone)]
pub struct MemberDirectory<'a> {
    members: &'a [Member],
    index: HashMap<&'a str, usize>,
}

impl<'a> MemberDirectory<'a> {
    pub fn new(members: &'a [Member]) -> Self {
        let mut index = HashMap::with_capacity(members.len());
        for (position, member) in members.iter().enumerate() {
            // 重複的 id 以第一筆為準
            index.entry(member.id.as_str()).or_insert(position);
        }
        Self { members, index }
    }

    pub fn members(&self) -> &'a [Member] {
        self.members
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn display_name(&self, id: &str) -> Option<&'a str> {
        self.position(id)
            .map(|position| self.members[position].display_name.as_str())
    }

    /// Display name, or `"Unknown"` for ids not in the list.
    pub fn label(&self, id: &str) -> &'a str {
        self.display_name(id).unwrap_or(UNKNOWN_MEMBER_LABEL)
    }
}
