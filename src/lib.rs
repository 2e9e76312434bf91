//! Hierarchical role based access control (RBAC) with conditional allow and deny rules.
//!
//! An `Acl` answers one question: *may role R exercise privilege P, given an optional runtime
//! context?* Roles are organized in a directed inheritance graph, every role may have several
//! parents. For each role privileges are explicitly allowed or explicitly denied, either one by
//! one or all at once by a wildcard. Every rule may carry an assertion, a predicate evaluated at
//! query time with the queried role, privilege and context.
//!
//! # Introduction
//!
//! In the sense of this implementation:
//! * a *role* is an object that may request to exercise a privilege.
//! * a *privilege* is an opaque name of an action, e.g. "news.read" or "forum.update".
//! * the *wildcard* privilege stands for every privilege a role has no explicit rule for.
//!
//! ## Denied by default
//!
//! Until a developer specifies an "allow" rule, the `Acl` denies every privilege to every role.
//! Unknown roles have no privileges at all, querying them is not an error.
//!
//! ```rust
//! # extern crate zorq_rbac;
//! use zorq_rbac::Acl;
//!
//! let acl: Acl = Acl::new();
//!
//! assert!(!acl.is_allowed("santa", "chimney", None));
//! ```
//!
//! # Registering Roles
//!
//! Roles must be registered before rules can be defined for them. A role may name its parents
//! upon registration, each parent must already be registered. Registering an existing role again
//! appends the given parents to the ones it already has:
//!
//! ```rust
//! # extern crate zorq_rbac;
//! # use zorq_rbac::Acl;
//! # let mut acl: Acl = Acl::new();
//! acl.add_role("guest", &[])?;
//! acl.add_role("member", &["guest"])?;
//! acl.add_role("news_admin", &["member"])?;
//! acl.add_role("forum_admin", &["member"])?;
//! acl.add_role("admin", &["news_admin", "forum_admin"])?;
//!
//! assert!(acl.belongs_to("admin", "guest"));
//! assert!(!acl.belongs_to("news_admin", "forum_admin"));
//! # Ok::<(), zorq_rbac::Error>(())
//! ```
//!
//! # Defining Access Controls
//!
//! `allow` and `deny` take a single privilege, a list of privileges or `Privileges::All` for the
//! wildcard. For the exact same privilege a role is either allowed or denied, never both: the
//! later rule replaces the earlier one. A wildcard rule clears every rule of the opposite kind.
//!
//! ```rust
//! # extern crate zorq_rbac;
//! # use zorq_rbac::{Acl, Privileges};
//! # let mut acl: Acl = Acl::new();
//! # acl.add_role("guest", &[])?;
//! # acl.add_role("member", &["guest"])?;
//! # acl.add_role("news_admin", &["member"])?;
//! # acl.add_role("forum_admin", &["member"])?;
//! # acl.add_role("admin", &["news_admin", "forum_admin"])?;
//! acl.allow("guest", vec!["news.read", "forum.read", "profile.create"])?;
//! acl.allow("member", "forum.create")?;
//! acl.allow("news_admin", vec!["news.create", "news.update"])?;
//! acl.allow("forum_admin", "forum.update")?;
//! acl.allow("admin", Privileges::All)?;
//!
//! // members already have a profile
//! acl.deny("member", "profile.create")?;
//!
//! // inherited from guest
//! assert!(acl.is_allowed("member", "news.read", None));
//! // denied on member, forum_admin inherits the denial
//! assert!(!acl.is_allowed("forum_admin", "profile.create", None));
//! // admin is allowed everything by wildcard
//! assert!(acl.is_allowed("admin", "news.delete", None));
//! // nobody allowed it
//! assert!(!acl.is_allowed("guest", "news.delete", None));
//! # Ok::<(), zorq_rbac::Error>(())
//! ```
//!
//! # Precedence
//!
//! A query first looks at the queried role itself, in this order:
//!
//! 1. an allow rule for the exact privilege,
//! 2. a deny rule for the exact privilege,
//! 3. the wildcard allow rule,
//! 4. the wildcard deny rule.
//!
//! The first rule found decides, so a rule for the exact privilege always beats a wildcard rule
//! of the same role. Only if the role has no rule at all, its parents are asked in
//! the order they were registered, and the first parent coming to a decision wins.
//!
//! > *FIFO Order for Role Queries*:
//! > When specifying multiple parents for a role, the first parent listed is the first one
//! > searched for rules applicable to an authorization query.
//!
//! # Assertions
//!
//! A rule may be guarded by an assertion. For an allow rule the assertion decides whether the
//! privilege is allowed, for a deny rule whether the privilege is still denied. Assertions
//! receive the role and privilege the rule was found on (`None` for the wildcard) and the
//! context handed to the query. The context type is a parameter of the `Acl`:
//!
//! ```rust
//! # extern crate zorq_rbac;
//! use zorq_rbac::Acl;
//!
//! struct Request { owner: &'static str, user: &'static str }
//!
//! let mut acl: Acl<Request> = Acl::new();
//!
//! acl.add_role("author", &[])?;
//! acl.allow_if("author", "post.edit", |_role: &str, _privilege: Option<&str>, request: Option<&Request>| {
//!     request.map_or(false, |r| r.owner == r.user)
//! })?;
//!
//! let own   = Request{owner: "sally", user: "sally"};
//! let other = Request{owner: "sally", user: "bob"};
//!
//! assert!( acl.is_allowed("author", "post.edit", Some(&own)));
//! assert!(!acl.is_allowed("author", "post.edit", Some(&other)));
//! assert!(!acl.is_allowed("author", "post.edit", None));
//! # Ok::<(), zorq_rbac::Error>(())
//! ```
//!
//! # Concurrency
//!
//! The `Acl` is a plain synchronous data structure. Rules are defined through `&mut self` and
//! queried through `&self`. Assertions must be `Send + Sync`, so an `Acl` can be shared between
//! threads behind a `std::sync::RwLock`.

use log::{trace, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;


// Helper types ///////////////////////////////////////////////////////////////////////////////////


/// Result type of all fallible `Acl` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Allow or deny access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    /// The rule grants the privilege.
    Allow,
    /// The rule withholds the privilege.
    Deny
} // enum Access

/// Outcome of resolving a privilege for a role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Allow,
    Deny,
    /// Neither the role nor any of its ancestors has a rule for the privilege.
    Unknown,
} // enum Resolution

impl Resolution {

    /// Collapses the resolution to a decision. `Unknown` is denied.
    #[inline]
    pub fn is_allowed(self) -> bool {
        self == Resolution::Allow
    } // is_allowed

} // impl Resolution

impl From<bool> for Resolution {

    #[inline]
    fn from(allowed: bool) -> Self {
        if allowed { Resolution::Allow } else { Resolution::Deny }
    } // from

} // impl From<bool> for Resolution

/// Controls how rules for named privileges interact with the wildcard rule of the opposite kind
/// on the same role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WildcardPolicy {
    /// Named rules leave the opposite wildcard rule in place. The wildcard keeps governing every
    /// privilege without an exact rule.
    Retain,
    /// A non-empty list of named allows removes the wildcard deny rule of the role and vice
    /// versa. Privileges without any rule then fall through to the parents.
    Supersede,
} // enum WildcardPolicy

impl Default for WildcardPolicy {

    fn default() -> Self {
        WildcardPolicy::Retain
    } // default

} // impl Default for WildcardPolicy

/// The privileges a rule is defined for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Privileges {
    /// The wildcard, every privilege not explicitly ruled on.
    All,
    /// Exactly the listed privileges.
    Only(Vec<String>),
} // enum Privileges

impl From<&str> for Privileges {

    fn from(name: &str) -> Self {
        Privileges::Only(vec![name.to_owned()])
    } // from

} // impl From<&str> for Privileges

impl From<String> for Privileges {

    fn from(name: String) -> Self {
        Privileges::Only(vec![name])
    } // from

} // impl From<String> for Privileges

impl From<Vec<&str>> for Privileges {

    fn from(names: Vec<&str>) -> Self {
        Privileges::Only(names.into_iter().map(String::from).collect())
    } // from

} // impl From<Vec<&str>> for Privileges

impl From<Vec<String>> for Privileges {

    fn from(names: Vec<String>) -> Self {
        Privileges::Only(names)
    } // from

} // impl From<Vec<String>> for Privileges

impl From<&[&str]> for Privileges {

    fn from(names: &[&str]) -> Self {
        Privileges::Only(names.iter().map(|name| String::from(*name)).collect())
    } // from

} // impl From<&[&str]> for Privileges

impl<const N: usize> From<[&str; N]> for Privileges {

    fn from(names: [&str; N]) -> Self {
        Privileges::Only(names.iter().map(|name| String::from(*name)).collect())
    } // from

} // impl From<[&str; N]> for Privileges


// Assertion //////////////////////////////////////////////////////////////////////////////////////


/// A predicate guarding a rule. It is evaluated every time the rule is consulted.
///
/// `privilege` is `None` if the rule is the wildcard rule of `role`. Any closure of the form
/// `Fn(&str, Option<&str>, Option<&C>) -> bool` is an assertion.
pub trait Assertion<C>: Send + Sync {

    fn evaluate(&self, role: &str, privilege: Option<&str>, context: Option<&C>) -> bool;

} // trait Assertion

impl<C, F> Assertion<C> for F
where
    F: Fn(&str, Option<&str>, Option<&C>) -> bool + Send + Sync,
{

    #[inline]
    fn evaluate(&self, role: &str, privilege: Option<&str>, context: Option<&C>) -> bool {
        self(role, privilege, context)
    } // evaluate

} // impl Assertion for Fn


// Rule ///////////////////////////////////////////////////////////////////////////////////////////


/// A single allow or deny rule. Which one depends on the store holding it.
struct Rule<C> {
    assertion: Option<Arc<dyn Assertion<C>>>,
} // struct Rule

impl<C> Rule<C> {

    /// A rule without assertion always holds.
    fn check(&self, role: &str, privilege: Option<&str>, context: Option<&C>) -> bool {
        match &self.assertion {
            None            => true,
            Some(assertion) => {
                trace!("    evaluating assertion for {:?} on {}", privilege, role);
                assertion.evaluate(role, privilege, context)
            }, // Some
        } // match
    } // check

} // impl Rule

impl<C> fmt::Debug for Rule<C> {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.assertion {
            None    => f.write_str("Unconditional"),
            Some(_) => f.write_str("Conditional"),
        } // match
    } // fmt

} // impl fmt::Debug for Rule


// Store //////////////////////////////////////////////////////////////////////////////////////////


/// Either the allowed or the denied rules of one role.
struct Store<C> {
    all:    Option<Rule<C>>,
    named:  HashMap<String, Rule<C>>,
} // struct Store

impl<C> Store<C> {

    fn new() -> Self {
        Store{all: None, named: HashMap::new()}
    } // new

    fn get(&self, privilege: Option<&str>) -> Option<&Rule<C>> {
        match privilege {
            None       => self.all.as_ref(),
            Some(name) => self.named.get(name),
        } // match
    } // get

    fn insert(&mut self, privilege: Option<String>, rule: Rule<C>) {
        match privilege {
            None       => self.all = Some(rule),
            Some(name) => { self.named.insert(name, rule); },
        } // match
    } // insert

    fn remove(&mut self, privilege: Option<&str>) {
        match privilege {
            None       => self.all = None,
            Some(name) => { self.named.remove(name); },
        } // match
    } // remove

    fn clear(&mut self) {
        self.all = None;
        self.named.clear();
    } // clear

    /// Returns the privileges ruled on, the wildcard first and the named ones sorted.
    fn privileges(&self) -> Vec<Option<&str>> {
        let mut named: Vec<&str> = self.named.keys().map(String::as_str).collect();
        let mut v = Vec::with_capacity(named.len() + 1);

        named.sort_unstable();
        if self.all.is_some() {
            v.push(None);
        } // if
        v.extend(named.into_iter().map(Some));
        v
    } // privileges

} // impl Store

impl<C> fmt::Debug for Store<C> {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();

        for privilege in self.privileges() {
            if let Some(rule) = self.get(privilege) {
                map.entry(&privilege, rule);
            } // if let
        } // for
        map.finish()
    } // fmt

} // impl fmt::Debug for Store


// Role ///////////////////////////////////////////////////////////////////////////////////////////


/// A registered role: its parents in registration order and its allowed and denied rules.
struct Role<C> {
    parents:    Vec<String>,
    allowed:    Store<C>,
    denied:     Store<C>,
} // struct Role

impl<C> Role<C> {

    fn new(parents: Vec<String>) -> Self {
        Role{parents, allowed: Store::new(), denied: Store::new()}
    } // new

    #[inline]
    fn store(&self, access: Access) -> &Store<C> {
        match access {
            Access::Allow => &self.allowed,
            Access::Deny  => &self.denied,
        } // match
    } // store

    /// Returns the store for `access` and the opposite store.
    #[inline]
    fn stores_mut(&mut self, access: Access) -> (&mut Store<C>, &mut Store<C>) {
        match access {
            Access::Allow => (&mut self.allowed, &mut self.denied),
            Access::Deny  => (&mut self.denied, &mut self.allowed),
        } // match
    } // stores_mut

    /// Decides on the rules of this role alone, parents are not consulted.
    fn resolve_direct(&self, name: &str, privilege: &str, context: Option<&C>) -> Resolution {
        if let Some(rule) = self.allowed.get(Some(privilege)) {
            trace!("    matching allow rule for {} on {}", privilege, name);
            return rule.check(name, Some(privilege), context).into();
        } // if let
        // a deny assertion holding means the privilege stays denied
        if let Some(rule) = self.denied.get(Some(privilege)) {
            trace!("    matching deny rule for {} on {}", privilege, name);
            return (!rule.check(name, Some(privilege), context)).into();
        } // if let
        if let Some(rule) = self.allowed.get(None) {
            trace!("    matching wildcard allow rule on {}", name);
            return rule.check(name, None, context).into();
        } // if let
        if let Some(rule) = self.denied.get(None) {
            trace!("    matching wildcard deny rule on {}", name);
            return (!rule.check(name, None, context)).into();
        } // if let
        Resolution::Unknown
    } // resolve_direct

} // impl Role

impl<C> fmt::Debug for Role<C> {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Role")
            .field("parents", &self.parents)
            .field("allowed", &self.allowed)
            .field("denied", &self.denied)
            .finish()
    } // fmt

} // impl fmt::Debug for Role


// Walk ///////////////////////////////////////////////////////////////////////////////////////////


/// Bookkeeping of a single query walking up the role graph. Every role is entered at most once,
/// which terminates walks on cyclic graphs.
struct Walk<'a> {
    seen:   HashSet<&'a str>,
    path:   Vec<&'a str>,
} // struct Walk

impl<'a> Walk<'a> {

    fn new() -> Self {
        Walk{seen: HashSet::new(), path: Vec::new()}
    } // new

    /// Returns false if the role was entered before during this walk.
    fn enter(&mut self, role: &'a str) -> bool {
        if self.seen.insert(role) {
            self.path.push(role);
            return true;
        } // if
        if self.path.contains(&role) {
            warn!("cycle in role graph: {} -> {}", self.path.join(" -> "), role);
        } else {
            trace!("    role {} already visited", role);
        } // else
        false
    } // enter

    #[inline]
    fn leave(&mut self) {
        self.path.pop();
    } // leave

} // impl Walk


// Acl ////////////////////////////////////////////////////////////////////////////////////////////


/// Main structure holding the registered roles and their rules. Roles are not created upon rule
/// definition, but must be registered beforehand. Everything not allowed is denied.
///
/// `C` is the type of the context handed to assertions.
pub struct Acl<C = ()> {
    order:  Vec<String>,
    roles:  HashMap<String, Role<C>>,
    policy: WildcardPolicy,
} // Acl

impl<C> Acl<C> {

    /// Creates a new, empty `Acl` using `WildcardPolicy::Retain`.
    pub fn new() -> Self {
        Self::with_policy(WildcardPolicy::default())
    } // new

    /// Creates a new, empty `Acl` using the given wildcard policy.
    pub fn with_policy(policy: WildcardPolicy) -> Self {
        trace!("creating new acl with {:?} wildcard policy", policy);
        Acl{
            order:  Vec::new(),
            roles:  HashMap::new(),
            policy,
        } // Acl
    } // with_policy

    #[inline]
    pub fn policy(&self) -> WildcardPolicy {
        self.policy
    } // policy

    /// Adds a new role or adds parents to an existing role. Returns an error if a parent is
    /// unknown.
    ///
    /// A new role is only created if all parents are known. Parents of an existing role are
    /// checked and appended one after the other, so parents preceding an unknown one are kept.
    /// Duplicate parents and the role itself are skipped.
    pub fn add_role(&mut self, name: &str, parents: &[&str]) -> Result<()> {
        trace!("adding role {} with parents {:?}", name, parents);
        if self.roles.contains_key(name) {
            for parent in parents {
                if !self.roles.contains_key(*parent) {
                    warn!("missing parent for role {}: {}", name, parent);
                    return Err(Error::RoleNotFound(String::from(*parent)));
                } // if
                if *parent == name {
                    continue;
                } // if
                if let Some(role) = self.roles.get_mut(name) {
                    if !role.parents.iter().any(|p| p == parent) {
                        role.parents.push(String::from(*parent));
                    } // if
                } // if let
            } // for
            return Ok(());
        } // if

        let mut list: Vec<String> = Vec::with_capacity(parents.len());

        for parent in parents {
            if !self.roles.contains_key(*parent) {
                warn!("missing parent for new role {}: {}", name, parent);
                return Err(Error::RoleNotFound(String::from(*parent)));
            } // if
            if !list.iter().any(|p| p == parent) {
                list.push(String::from(*parent));
            } // if
        } // for
        self.order.push(String::from(name));
        self.roles.insert(String::from(name), Role::new(list));
        Ok(())
    } // add_role

    /// Returns true if role is defined.
    #[inline]
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.contains_key(name)
    } // has_role

    /// Returns all roles in registration order.
    pub fn roles(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    } // roles

    /// Iterates roles in registration order.
    fn entries(&self) -> impl Iterator<Item = (&str, &Role<C>)> + '_ {
        self.order.iter().filter_map(move |name| {
            self.roles.get(name).map(|role| (name.as_str(), role))
        })
    } // entries

    /// Returns the direct parents of role in registration order. Returns an error if role is
    /// undefined.
    pub fn get_role_parents(&self, name: &str) -> Result<Vec<&str>> {
        trace!("getting role parents for: {}", name);
        if let Some(role) = self.roles.get(name) {
            return Ok(role.parents.iter().map(String::as_str).collect())
        } // if
        warn!("missing role while getting parents: {}", name);
        Err(Error::RoleNotFound(String::from(name)))
    } // get_role_parents

    fn iter_roles<'a>(&'a self, parents: &'a [String], walk: &mut Walk<'a>, lineage: &mut Vec<&'a str>) {
        for parent in parents {
            // only descend into roles we haven't seen already
            if walk.enter(parent) {
                lineage.push(parent);
                if let Some(role) = self.roles.get(parent) {
                    self.iter_roles(&role.parents, walk, lineage);
                } // if let
                walk.leave();
            } // if
        } // for
    } // iter_roles

    /// Returns the role followed by its ancestors in the order queries visit them. Returns an
    /// empty vector if role is undefined.
    pub fn get_role_lineage<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        trace!("getting role lineage for: {}", name);
        match self.roles.get(name) {
            None       => vec![],
            Some(role) => {
                let mut walk    = Walk::new();
                let mut lineage = vec![name];

                walk.enter(name);
                self.iter_roles(&role.parents, &mut walk, &mut lineage);
                lineage
            }, // Some
        } // match
    } // get_role_lineage

    /// Returns the ancestors of the role. Returns an empty vector if role is undefined.
    pub fn get_role_ancestors<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        trace!("getting role ancestors for: {}", name);
        let lin = self.get_role_lineage(name);

        if lin.len() > 1 {
            lin[1..].to_vec()
        } else {
            vec![]
        } // else
    } // get_role_ancestors

    /// Returns true if `child` is `parent` or inherits from it, directly or through any of its
    /// ancestors. Returns false if `child` is undefined.
    pub fn belongs_to(&self, child: &str, parent: &str) -> bool {
        trace!("checking if {} belongs to {}", child, parent);
        if !self.roles.contains_key(child) {
            return false;
        } // if
        if child == parent {
            return true;
        } // if
        self.belongs_to_recursive(child, parent, &mut Walk::new())
    } // belongs_to

    fn belongs_to_recursive<'a>(&'a self, child: &'a str, parent: &str, walk: &mut Walk<'a>) -> bool {
        let role = match self.roles.get(child) {
            Some(role) => role,
            None       => return false,
        }; // match
        if !walk.enter(child) {
            return false;
        } // if

        let found = role.parents.iter().any(|p| p == parent)
            || role.parents.iter().any(|p| self.belongs_to_recursive(p, parent, walk));

        walk.leave();
        found
    } // belongs_to_recursive

    /// Allows privileges for role without assertion. Returns an error if role is undefined.
    #[inline]
    pub fn allow<P: Into<Privileges>>(&mut self, role: &str, privileges: P) -> Result<()> {
        self.set_rule(role, privileges.into(), Access::Allow, None)
    } // allow

    /// Allows privileges for role as long as `condition` holds. Returns an error if role is
    /// undefined.
    #[inline]
    pub fn allow_if<P, F>(&mut self, role: &str, privileges: P, condition: F) -> Result<()>
    where
        P: Into<Privileges>,
        F: Fn(&str, Option<&str>, Option<&C>) -> bool + Send + Sync + 'static,
    {
        self.set_rule(role, privileges.into(), Access::Allow, Some(Arc::new(condition)))
    } // allow_if

    /// Allows privileges for role guarded by an optional, possibly shared assertion. Returns an
    /// error if role is undefined.
    #[inline]
    pub fn allow_with<P>(&mut self, role: &str, privileges: P, assertion: Option<Arc<dyn Assertion<C>>>) -> Result<()>
    where
        P: Into<Privileges>,
    {
        self.set_rule(role, privileges.into(), Access::Allow, assertion)
    } // allow_with

    /// Denies privileges for role without assertion. Returns an error if role is undefined.
    #[inline]
    pub fn deny<P: Into<Privileges>>(&mut self, role: &str, privileges: P) -> Result<()> {
        self.set_rule(role, privileges.into(), Access::Deny, None)
    } // deny

    /// Denies privileges for role as long as `condition` holds. If it does not hold the
    /// privileges are allowed. Returns an error if role is undefined.
    #[inline]
    pub fn deny_if<P, F>(&mut self, role: &str, privileges: P, condition: F) -> Result<()>
    where
        P: Into<Privileges>,
        F: Fn(&str, Option<&str>, Option<&C>) -> bool + Send + Sync + 'static,
    {
        self.set_rule(role, privileges.into(), Access::Deny, Some(Arc::new(condition)))
    } // deny_if

    /// Denies privileges for role guarded by an optional, possibly shared assertion. Returns an
    /// error if role is undefined.
    #[inline]
    pub fn deny_with<P>(&mut self, role: &str, privileges: P, assertion: Option<Arc<dyn Assertion<C>>>) -> Result<()>
    where
        P: Into<Privileges>,
    {
        self.set_rule(role, privileges.into(), Access::Deny, assertion)
    } // deny_with

    /// Defines a rule for privileges on role. Returns an error if role is undefined.
    ///
    /// A rule for a privilege replaces a rule of the opposite kind for the same privilege. A
    /// wildcard rule clears all rules of the opposite kind. Whether named rules also remove the
    /// opposite wildcard rule depends on the `WildcardPolicy`. An empty list of privileges
    /// changes nothing.
    pub fn set_rule(&mut self, role: &str, privileges: Privileges, access: Access, assertion: Option<Arc<dyn Assertion<C>>>) -> Result<()> {
        trace!("setting {:?} rule for {} with {:?} privileges", access, role, privileges);
        let policy = self.policy;
        let entry  = match self.roles.get_mut(role) {
            Some(entry) => entry,
            None        => {
                warn!("missing role while setting {:?} rule: {}", access, role);
                return Err(Error::RoleNotFound(String::from(role)));
            }, // None
        }; // match
        let (target, opposite) = entry.stores_mut(access);

        match privileges {
            Privileges::All => {
                target.insert(None, Rule{assertion});
                opposite.clear();
            }, // All
            Privileges::Only(names) => {
                if !names.is_empty() && policy == WildcardPolicy::Supersede {
                    opposite.remove(None);
                } // if
                for name in names {
                    opposite.remove(Some(name.as_str()));
                    target.insert(Some(name), Rule{assertion: assertion.clone()});
                } // for
            }, // Only
        } // match
        Ok(())
    } // set_rule

    /// Returns the privileges role has allow rules for, `None` being the wildcard. Returns an
    /// error if role is undefined.
    pub fn get_allowed_privileges(&self, role: &str) -> Result<Vec<Option<&str>>> {
        self.get_privileges(role, Access::Allow)
    } // get_allowed_privileges

    /// Returns the privileges role has deny rules for, `None` being the wildcard. Returns an
    /// error if role is undefined.
    pub fn get_denied_privileges(&self, role: &str) -> Result<Vec<Option<&str>>> {
        self.get_privileges(role, Access::Deny)
    } // get_denied_privileges

    fn get_privileges(&self, role: &str, access: Access) -> Result<Vec<Option<&str>>> {
        trace!("getting {:?} privileges for: {}", access, role);
        match self.roles.get(role) {
            Some(entry) => Ok(entry.store(access).privileges()),
            None        => {
                warn!("missing role while getting privileges: {}", role);
                Err(Error::RoleNotFound(String::from(role)))
            }, // None
        } // match
    } // get_privileges

    /// Returns true if privilege is allowed for role. Undefined roles have no privileges.
    #[inline]
    pub fn is_allowed(&self, role: &str, privilege: &str, context: Option<&C>) -> bool {
        self.resolve(role, privilege, context).is_allowed()
    } // is_allowed

    /// Returns true if privilege is not allowed for role.
    #[inline]
    pub fn is_denied(&self, role: &str, privilege: &str, context: Option<&C>) -> bool {
        !self.is_allowed(role, privilege, context)
    } // is_denied

    /// Resolves privilege for role without collapsing `Unknown`. Undefined roles resolve to
    /// `Unknown`.
    ///
    /// # Precedence
    ///
    /// The rules of the role itself are searched first: exact allow, exact deny, wildcard allow,
    /// wildcard deny. The first match decides, assertions included. Without any match the
    /// parents are resolved depth first in registration order and the first decision wins. A
    /// role reached twice during one query is not searched again.
    pub fn resolve(&self, role: &str, privilege: &str, context: Option<&C>) -> Resolution {
        trace!("resolving {} for {}", privilege, role);
        let resolution = self.resolve_recursive(role, privilege, context, &mut Walk::new());

        trace!("    resolved {} for {} to {:?}", privilege, role, resolution);
        resolution
    } // resolve

    fn resolve_recursive<'a>(&'a self, name: &'a str, privilege: &str, context: Option<&C>, walk: &mut Walk<'a>) -> Resolution {
        let role = match self.roles.get(name) {
            Some(role) => role,
            None       => return Resolution::Unknown,
        }; // match
        if !walk.enter(name) {
            return Resolution::Unknown;
        } // if

        let mut resolution = role.resolve_direct(name, privilege, context);

        if resolution == Resolution::Unknown {
            for parent in &role.parents {
                resolution = self.resolve_recursive(parent, privilege, context, walk);
                if resolution != Resolution::Unknown {
                    break;
                } // if
            } // for
        } // if
        walk.leave();
        resolution
    } // resolve_recursive

    /// Merges the roles and rules of `other` into this `Acl`. Rules of `other` replace rules
    /// defined here for the same role and privilege. The wildcard policy of this `Acl` applies.
    ///
    /// All roles are registered before any parent relation is added, so the order roles and
    /// parents were registered in `other` doesn't matter. Wildcard rules are merged before named
    /// ones, allow rules before deny rules.
    pub fn merge(&mut self, other: &Acl<C>) -> Result<()> {
        trace!("merging acl with {} roles", other.order.len());
        for (name, _) in other.entries() {
            if !self.has_role(name) {
                self.add_role(name, &[])?;
            } // if
        } // for
        for (name, role) in other.entries() {
            let parents: Vec<&str> = role.parents.iter().map(String::as_str).collect();

            self.add_role(name, &parents)?;
        } // for
        for (name, role) in other.entries() {
            for &access in &[Access::Allow, Access::Deny] {
                if let Some(rule) = role.store(access).get(None) {
                    self.set_rule(name, Privileges::All, access, rule.assertion.clone())?;
                } // if let
            } // for
        } // for
        for &access in &[Access::Allow, Access::Deny] {
            for (name, role) in other.entries() {
                let store = role.store(access);

                for privilege in store.privileges().into_iter().flatten() {
                    if let Some(rule) = store.get(Some(privilege)) {
                        self.set_rule(name, privilege.into(), access, rule.assertion.clone())?;
                    } // if let
                } // for
            } // for
        } // for
        Ok(())
    } // merge

} // impl Acl

impl<C> Default for Acl<C> {

    fn default() -> Self {
        Self::new()
    } // default

} // impl Default for Acl

impl<C> fmt::Debug for Acl<C> {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    } // fmt

} // impl fmt::Debug for Acl


// Error //////////////////////////////////////////////////////////////////////////////////////////


#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Role not found: {0}")]
    RoleNotFound(String),
} // enum Error


// Tests //////////////////////////////////////////////////////////////////////////////////////////


// mod tests
