//! A small shop domain on top of `MemoryStore`.
//!
//! `Store` has many `Branch`es, a `Branch` has many `Profile`s, each
//! `Profile` links one `User` to a branch, and a `Shrubbery` belongs to a
//! branch.

use crate::traits::Entity;
use crate::{AttrValue, EntityRef, MemoryStore, Rule, RuleExt};

/// The requesting user, as an application would hold it after login.
#[derive(Debug, Clone)]
pub(crate) struct Person {
    pub id: EntityRef,
    pub username: String,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub branch: EntityRef,
    pub store: EntityRef,
}

pub(crate) struct Shop {
    pub db: MemoryStore,
}

impl Shop {
    pub fn new() -> Self {
        let db = MemoryStore::new();
        for kind in ["Store", "Branch", "Profile", "User", "Shrubbery"] {
            db.define_kind(kind).unwrap();
        }
        db.relate_many("Store", "branch", "Branch", "store").unwrap();
        db.relate_many("Branch", "profile", "Profile", "branch")
            .unwrap();
        db.relate_many("Branch", "shrubbery", "Shrubbery", "branch")
            .unwrap();
        Self { db }
    }

    pub fn store(&self, name: &str) -> EntityRef {
        self.db
            .insert("Store", [("name", AttrValue::from(name))])
            .unwrap()
    }

    pub fn branch(&self, store: &EntityRef) -> EntityRef {
        self.db
            .insert("Branch", [("store", AttrValue::from(store))])
            .unwrap()
    }

    /// A user with a profile in a branch of a fresh store.
    pub fn user(&self, username: &str) -> Person {
        let store = self.store(&format!("home-of-{username}"));
        let branch = self.branch(&store);
        self.user_in(username, &branch)
    }

    pub fn user_in(&self, username: &str, branch: &EntityRef) -> Person {
        self.person(username, branch, false, false)
    }

    pub fn superuser(&self, username: &str) -> Person {
        let store = self.store(&format!("home-of-{username}"));
        let branch = self.branch(&store);
        self.person(username, &branch, true, false)
    }

    pub fn staff(&self, username: &str) -> Person {
        let store = self.store(&format!("home-of-{username}"));
        let branch = self.branch(&store);
        self.person(username, &branch, false, true)
    }

    fn person(
        &self,
        username: &str,
        branch: &EntityRef,
        is_superuser: bool,
        is_staff: bool,
    ) -> Person {
        let id = self
            .db
            .insert(
                "User",
                [
                    ("username", AttrValue::from(username)),
                    ("is_superuser", AttrValue::from(is_superuser)),
                    ("is_staff", AttrValue::from(is_staff)),
                ],
            )
            .unwrap();
        self.db
            .insert(
                "Profile",
                [
                    ("user", AttrValue::from(&id)),
                    ("branch", AttrValue::from(branch)),
                ],
            )
            .unwrap();

        let Some(AttrValue::Ref(store)) = self.attr(branch, "store") else {
            panic!("branch {branch} has no store");
        };
        Person {
            id,
            username: username.to_string(),
            is_superuser,
            is_staff,
            branch: branch.clone(),
            store,
        }
    }

    pub fn shrubbery(&self, branch: &EntityRef) -> EntityRef {
        self.db
            .insert("Shrubbery", [("branch", AttrValue::from(branch))])
            .unwrap()
    }

    /// A shrubbery in a branch of a store nobody works at.
    pub fn stray_shrubbery(&self) -> EntityRef {
        let store = self.store("elsewhere");
        let branch = self.branch(&store);
        self.shrubbery(&branch)
    }

    fn attr(&self, entity: &EntityRef, name: &str) -> Option<AttrValue> {
        let row = self.db.get(entity).ok()?;
        match row.field(name).ok()? {
            crate::Field::Value(value) => Some(value),
            crate::Field::Related(related) => {
                related.first().map(|e| AttrValue::Ref(e.entity_ref()))
            }
        }
    }

    pub fn check<R: Rule<Person> + ?Sized>(
        &self,
        rule: &R,
        user: &Person,
        entity: &EntityRef,
    ) -> bool {
        let row = self.db.get(entity).unwrap();
        let instance: &dyn Entity = &row;
        rule.check(user, Some(instance)).unwrap()
    }

    /// Identities of the rows of `kind` the rule selects for `user`.
    pub fn visible<R: Rule<Person> + ?Sized>(
        &self,
        rule: &R,
        user: &Person,
        kind: &str,
    ) -> Vec<EntityRef> {
        let table = self.db.table(kind).unwrap();
        rule.filter(user, &table)
            .unwrap()
            .into_iter()
            .map(|row| row.entity().clone())
            .collect()
    }

    /// Every row of `kind` gets the same answer from `check` and from the
    /// rule's predicate, and `filter` selects exactly the checked rows.
    pub fn assert_consistent<R: Rule<Person> + ?Sized>(&self, rule: &R, user: &Person, kind: &str) {
        let predicate = rule.query(user).unwrap();
        let mut checked = Vec::new();
        for row in self.db.table(kind).unwrap().all().unwrap() {
            let allowed = rule.check(user, Some(&row as &dyn Entity)).unwrap();
            assert_eq!(
                allowed,
                predicate.matches(&row).unwrap(),
                "check and query disagree on {row:?} for {} under {predicate}",
                user.username
            );
            if allowed {
                checked.push(row.entity().clone());
            }
        }
        assert_eq!(self.visible(rule, user, kind), checked);
    }
}
