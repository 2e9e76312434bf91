use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

use test_env_log::test;
use zorq_rbac::{Acl, Assertion, Error, Privileges, Resolution};


// Fixtures ///////////////////////////////////////////////////////////////////////////////////////


fn hierarchy() -> Acl {
    let mut acl = Acl::new();

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.add_role("member", &["guest"]).is_ok());
    assert!(acl.add_role("admin", &["member"]).is_ok());
    acl
} // hierarchy

/// Records every call and answers with a fixed value.
struct Recorder {
    answer: bool,
    calls:  Mutex<Vec<(String, Option<String>, Option<u32>)>>,
} // struct Recorder

impl Recorder {

    fn new(answer: bool) -> Arc<Self> {
        Arc::new(Recorder{answer, calls: Mutex::new(Vec::new())})
    } // new

    fn calls(&self) -> Vec<(String, Option<String>, Option<u32>)> {
        self.calls.lock().unwrap().clone()
    } // calls

} // impl Recorder

impl Assertion<u32> for Recorder {

    fn evaluate(&self, role: &str, privilege: Option<&str>, context: Option<&u32>) -> bool {
        self.calls.lock().unwrap().push((role.to_owned(), privilege.map(String::from), context.copied()));
        self.answer
    } // evaluate

} // impl Assertion for Recorder


// Role graph /////////////////////////////////////////////////////////////////////////////////////


#[test]
fn belongs_to_itself() {
    let acl = hierarchy();

    for role in acl.roles() {
        assert!(acl.belongs_to(role, role));
    } // for
} // belongs_to_itself

#[test]
fn roots_belong_to_nobody() {
    let mut acl = hierarchy();

    assert!(acl.add_role("loner", &[]).is_ok());
    for role in acl.roles() {
        if role != "loner" {
            assert!(!acl.belongs_to("loner", role));
        } // if
    } // for
} // roots_belong_to_nobody

#[test]
fn multiple_parents() {
    let mut acl: Acl = Acl::new();

    assert!(acl.add_role("p1", &[]).is_ok());
    assert!(acl.add_role("p2", &[]).is_ok());
    assert!(acl.add_role("child", &["p1", "p2"]).is_ok());

    assert!( acl.belongs_to("child", "p1"));
    assert!( acl.belongs_to("child", "p2"));
    assert!(!acl.belongs_to("p1", "child"));
    assert!(!acl.belongs_to("p2", "p1"));
} // multiple_parents

#[test]
fn parent_added_later() {
    let mut acl = hierarchy();

    assert!(acl.add_role("test", &[]).is_ok());
    assert!(acl.add_role("admin", &["test"]).is_ok());
    assert!(acl.belongs_to("admin", "test"));
    assert_eq!(acl.get_role_parents("admin").unwrap(), vec!["member", "test"]);
} // parent_added_later

#[test]
fn unknown_parent() {
    let mut acl = hierarchy();

    assert_eq!(acl.add_role("admin", &["santa"]), Err(Error::RoleNotFound(String::from("santa"))));
    assert_eq!(acl.add_role("elf", &["santa"]), Err(Error::RoleNotFound(String::from("santa"))));
    assert!(!acl.has_role("elf"));
    assert_eq!(acl.roles(), vec!["guest", "member", "admin"]);
} // unknown_parent


// Rules //////////////////////////////////////////////////////////////////////////////////////////


#[test]
fn transitive_inheritance() {
    let mut acl = hierarchy();

    assert!(acl.allow("guest", "read").is_ok());
    assert!(acl.is_allowed("member", "read", None));
    assert!(acl.is_allowed("admin", "read", None));
    assert!(!acl.is_allowed("admin", "write", None));
} // transitive_inheritance

#[test]
fn unknown_role_commands() {
    let mut acl = hierarchy();

    assert_eq!(acl.allow("santa", "chimney"), Err(Error::RoleNotFound(String::from("santa"))));
    assert_eq!(acl.deny("santa", "chimney"), Err(Error::RoleNotFound(String::from("santa"))));
    assert_eq!(acl.allow("santa", Privileges::All), Err(Error::RoleNotFound(String::from("santa"))));
    assert!(acl.get_allowed_privileges("santa").is_err());
    assert!(!acl.is_allowed("santa", "anything", None));
    assert!(!acl.belongs_to("santa", "guest"));
} // unknown_role_commands

#[test]
fn exact_deny_beats_wildcard_allow() {
    let mut acl = hierarchy();

    assert!(acl.allow("admin", Privileges::All).is_ok());
    assert!(acl.deny("admin", "x").is_ok());
    assert!( acl.is_allowed("admin", "y", None));
    assert!(!acl.is_allowed("admin", "x", None));
} // exact_deny_beats_wildcard_allow

#[test]
fn exact_allow_beats_wildcard_deny() {
    let mut acl = hierarchy();

    assert!(acl.allow("guest", "y").is_ok());
    assert!(acl.deny("member", Privileges::All).is_ok());
    assert!(acl.allow("member", "x").is_ok());
    assert!( acl.is_allowed("member", "x", None));
    // the wildcard deny on member hides the allow on guest
    assert!(!acl.is_allowed("member", "y", None));
    assert!(!acl.is_allowed("admin", "y", None));
} // exact_allow_beats_wildcard_deny

#[test]
fn own_rule_beats_inherited_rule() {
    let mut acl = hierarchy();

    assert!(acl.deny("guest", "read").is_ok());
    assert!(acl.allow("member", "read").is_ok());
    assert!(!acl.is_allowed("guest", "read", None));
    assert!( acl.is_allowed("member", "read", None));
    assert!( acl.is_allowed("admin", "read", None));
} // own_rule_beats_inherited_rule

#[test]
fn first_parent_wins() {
    let mut acl: Acl = Acl::new();

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.add_role("member", &[]).is_ok());
    assert!(acl.add_role("someUser", &["member", "guest"]).is_ok());
    assert!(acl.add_role("otherUser", &["guest", "member"]).is_ok());
    assert!(acl.deny("guest", "news.publish").is_ok());
    assert!(acl.allow("member", "news.publish").is_ok());

    assert!( acl.is_allowed("someUser", "news.publish", None));
    assert!(!acl.is_allowed("otherUser", "news.publish", None));
} // first_parent_wins


// Assertions /////////////////////////////////////////////////////////////////////////////////////


#[test]
fn assertion_arguments() {
    let mut acl: Acl<u32> = Acl::new();
    let rec = Recorder::new(true);

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.add_role("member", &["guest"]).is_ok());
    assert!(acl.allow_with("guest", "privilege.withcallback", Some(rec.clone())).is_ok());

    assert!(acl.is_allowed("member", "privilege.withcallback", Some(&42)));
    assert_eq!(rec.calls(), vec![(String::from("guest"), Some(String::from("privilege.withcallback")), Some(42))]);
} // assertion_arguments

#[test]
fn wildcard_assertion_arguments() {
    let mut acl: Acl<u32> = Acl::new();
    let rec = Recorder::new(false);

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.allow_with("guest", Privileges::All, Some(rec.clone())).is_ok());

    assert!(!acl.is_allowed("guest", "anything", None));
    assert_eq!(rec.calls(), vec![(String::from("guest"), None, None)]);
} // wildcard_assertion_arguments

#[test]
fn failing_assertions() {
    let mut acl: Acl<u32> = Acl::new();
    let no = Recorder::new(false);

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.allow("guest", "inherited").is_ok());
    assert!(acl.add_role("member", &["guest"]).is_ok());

    // a failing allow assertion denies, the parent is not asked
    assert!(acl.allow_with("member", vec!["a", "inherited"], Some(no.clone())).is_ok());
    assert!(!acl.is_allowed("member", "a", None));
    assert!(!acl.is_allowed("member", "inherited", None));
    assert_eq!(acl.resolve("member", "inherited", None), Resolution::Deny);

    // a failing deny assertion allows
    assert!(acl.deny_with("member", "b", Some(no.clone())).is_ok());
    assert!(acl.is_allowed("member", "b", None));
    assert_eq!(no.calls().len(), 4);
} // failing_assertions

#[test]
fn shared_assertion() {
    let mut acl: Acl<u32> = Acl::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let count = calls.clone();
    let small: Arc<dyn Assertion<u32>> = Arc::new(move |_: &str, _: Option<&str>, n: Option<&u32>| {
        count.fetch_add(1, Ordering::SeqCst);
        n.map_or(false, |n| *n < 10)
    });

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.allow_with("guest", ["a", "b"], Some(small.clone())).is_ok());
    assert!(acl.deny_with("guest", "c", Some(small)).is_ok());

    assert!( acl.is_allowed("guest", "a", Some(&1)));
    assert!(!acl.is_allowed("guest", "b", Some(&11)));
    assert!(!acl.is_allowed("guest", "c", Some(&1)));
    assert!( acl.is_allowed("guest", "c", Some(&11)));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
} // shared_assertion


// Merge //////////////////////////////////////////////////////////////////////////////////////////


fn news_acl() -> Acl<u32> {
    let mut acl = Acl::new();

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.add_role("admin", &[]).is_ok());
    assert!(acl.add_role("member", &["guest"]).is_ok());
    // admin gets a parent registered after it
    assert!(acl.add_role("admin", &["member"]).is_ok());
    assert!(acl.add_role("banned", &["guest"]).is_ok());

    assert!(acl.allow("guest", vec!["news.read", "profile.create"]).is_ok());
    assert!(acl.allow_if("member", "news.comment", |_: &str, _: Option<&str>, age: Option<&u32>| age.map_or(false, |a| *a >= 18)).is_ok());
    assert!(acl.deny("member", "profile.create").is_ok());
    assert!(acl.allow("admin", Privileges::All).is_ok());
    assert!(acl.deny("admin", "news.delete").is_ok());
    assert!(acl.deny("banned", Privileges::All).is_ok());
    assert!(acl.allow("banned", "appeal").is_ok());
    acl
} // news_acl

#[test]
fn merge_into_empty() {
    let other = news_acl();
    let mut acl: Acl<u32> = Acl::new();

    assert!(acl.merge(&other).is_ok());
    assert_eq!(acl.roles(), other.roles());

    let privileges = ["news.read", "news.comment", "news.delete", "profile.create", "appeal", "other"];

    for role in other.roles() {
        assert_eq!(acl.get_role_parents(role), other.get_role_parents(role));
        assert_eq!(acl.get_allowed_privileges(role), other.get_allowed_privileges(role));
        assert_eq!(acl.get_denied_privileges(role), other.get_denied_privileges(role));
        for privilege in privileges.iter() {
            for context in [None, Some(&12), Some(&30)].iter() {
                assert_eq!(
                    acl.resolve(role, privilege, *context),
                    other.resolve(role, privilege, *context),
                    "{} {} {:?}", role, privilege, context
                );
            } // for
        } // for
    } // for

    // the merged rules still decide as news_acl defines them
    assert_eq!(acl.resolve("admin", "news.delete", None), Resolution::Deny);
    assert_eq!(acl.resolve("admin", "news.create", None), Resolution::Allow);
    assert_eq!(acl.resolve("banned", "appeal", None), Resolution::Allow);
    assert_eq!(acl.resolve("banned", "news.read", None), Resolution::Deny);
    assert_eq!(acl.resolve("member", "news.comment", Some(&12)), Resolution::Deny);
    assert_eq!(acl.resolve("member", "news.comment", Some(&30)), Resolution::Allow);
    assert_eq!(acl.resolve("member", "profile.create", None), Resolution::Deny);
} // merge_into_empty

#[test]
fn merge_overrides() {
    let mut acl: Acl<u32> = Acl::new();

    assert!(acl.add_role("guest", &[]).is_ok());
    assert!(acl.add_role("editor", &[]).is_ok());
    assert!(acl.deny("guest", "news.read").is_ok());
    assert!(acl.allow("guest", "news.write").is_ok());
    assert!(acl.allow("editor", "news.publish").is_ok());

    assert!(acl.merge(&news_acl()).is_ok());

    // other's rule replaces ours, unrelated rules survive
    assert!( acl.is_allowed("guest", "news.read", None));
    assert!( acl.is_allowed("guest", "news.write", None));
    assert!( acl.is_allowed("editor", "news.publish", None));
    assert_eq!(acl.roles(), vec!["guest", "editor", "admin", "member", "banned"]);
} // merge_overrides


// Concurrency ////////////////////////////////////////////////////////////////////////////////////


#[test]
fn shared_between_threads() {
    let acl = Arc::new(RwLock::new(hierarchy()));

    assert!(acl.write().unwrap().allow("guest", "read").is_ok());

    let readers: Vec<_> = (0..4).map(|_| {
        let acl = acl.clone();

        thread::spawn(move || acl.read().unwrap().is_allowed("admin", "read", None))
    }).collect();

    for reader in readers {
        assert!(reader.join().unwrap());
    } // for
} // shared_between_threads
