use serde::Serialize;

/// A member record. `id` stays `None` until a repository saves it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Member {
    id: Option<u64>,
    name: String,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Member {
            id: None,
            name: name.into(),
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

/// Members are the same member when both have been saved under the same id.
/// An unsaved member equals nothing, not even itself.
impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
