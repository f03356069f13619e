// SPDX-License-Identifier: MPL-2.0

use crate::api::{Friend, Session, User};

/// Who is logged in, and their friends.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session: Option<Session>,
}

impl SessionState {
    pub fn login(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn logout(&mut self) {
        self.session = None;
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user().map(|u| u.id.as_str())
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }

    /// Replace the friend list. Ignored when nobody is logged in.
    pub fn set_friends(&mut self, friends: Vec<Friend>) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.user.friends = friends;
                true
            }
            None => false,
        }
    }

    pub fn friends(&self) -> &[Friend] {
        self.user().map(|u| u.friends.as_slice()).unwrap_or_default()
    }

    pub fn is_friend(&self, user_id: &str) -> bool {
        self.friends().iter().any(|f| f.id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            user: User {
                id: "me".to_string(),
                first_name: "Ada".to_string(),
                last_name: String::new(),
                friends: Vec::new(),
                picture_path: None,
            },
            token: "token".to_string(),
        }
    }

    fn friend(id: &str) -> Friend {
        Friend {
            id: id.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            occupation: None,
            picture_path: None,
        }
    }

    #[test]
    fn test_friends_need_a_session() {
        let mut state = SessionState::default();
        assert!(!state.set_friends(vec![friend("f1")]));
        assert!(state.friends().is_empty());

        state.login(session());
        assert!(state.set_friends(vec![friend("f1")]));
        assert!(state.is_friend("f1"));
        assert!(!state.is_friend("f2"));
        assert_eq!(state.user_id(), Some("me"));
        assert_eq!(state.token(), Some("token"));

        state.logout();
        assert!(!state.is_logged_in());
        assert!(!state.is_friend("f1"));
    }
}
