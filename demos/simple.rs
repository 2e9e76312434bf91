use log::info;
use zorq_rbac::*;

/// The requesting user, handed to assertions as context.
struct User {
    name:   &'static str,
    posts:  Vec<&'static str>,
} // struct User

fn main() -> Result<()> {
    env_logger::init();

    let mut acl: Acl<User> = Acl::new();

    acl.add_role("guest", &[])?;
    acl.add_role("member", &["guest"])?;
    acl.add_role("news_admin", &["member"])?;
    acl.add_role("forum_admin", &["member"])?;
    acl.add_role("admin", &["news_admin", "forum_admin"])?;

    // guest may only read and sign up
    acl.allow("guest", vec!["news.read", "forum.read", "profile.create"])?;

    // members may post, but edit their own posts only
    acl.allow("member", "forum.create")?;
    acl.allow_if("member", "forum.edit", |_role: &str, _privilege: Option<&str>, user: Option<&User>| {
        user.map_or(false, |u| u.posts.contains(&"welcome"))
    })?;
    acl.deny("member", "profile.create")?;

    acl.allow("news_admin", vec!["news.create", "news.update"])?;
    acl.allow("forum_admin", "forum.update")?;

    // admin inherits everything, but is allowed all privileges anyway
    acl.allow("admin", Privileges::All)?;

    let sally = User{name: "sally", posts: vec!["welcome"]};
    let bob   = User{name: "bob", posts: vec![]};

    for (role, privilege, user) in &[
        ("member", "news.read", &sally),
        ("member", "profile.create", &sally),
        ("member", "forum.edit", &sally),
        ("member", "forum.edit", &bob),
        ("forum_admin", "news.update", &bob),
        ("admin", "news.delete", &bob),
    ] {
        info!("{} as {} may {}: {}", user.name, role, privilege, acl.is_allowed(role, privilege, Some(*user)));
    } // for

    info!("admin lineage: {:?}", acl.get_role_lineage("admin"));
    Ok(())
} // main
