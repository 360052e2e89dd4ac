//! Falsification Tests: native artifacts
//!
//! # Toyota Way: Standardized Work (標準作業)
//! Same descriptor and environment, same bytes.

use std::path::PathBuf;

use proptest::prelude::*;
use sysservice_core::{Artifact, EnvFacts, PropertyList, ServiceDescriptor, UnitFile};

fn descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new("MyService", "com.myservice", "/usr/local/bin/myservice").with_args(["run"])
}

/// Claim: elevated launchd rendering targets LaunchDaemons.
#[test]
fn launchd_path_elevated() {
    let env = EnvFacts::new("root", "/var/root", true);
    assert_eq!(
        PropertyList::new(&descriptor(), &env).path(),
        PathBuf::from("/Library/LaunchDaemons/com.myservice.plist")
    );
}

/// Claim: non-elevated launchd rendering targets the user's LaunchAgents.
#[test]
fn launchd_path_user() {
    let env = EnvFacts::new("alice", "/Users/alice", false);
    assert_eq!(
        PropertyList::new(&descriptor(), &env).path(),
        PathBuf::from("/Users/alice/Library/LaunchAgents/com.myservice.plist")
    );
}

/// Claim: systemd unit location bifurcates on privilege.
#[test]
fn systemd_paths() {
    let user = EnvFacts::new("alice", "/home/alice", false);
    let root = EnvFacts::new("root", "/root", true);
    assert_eq!(
        UnitFile::new(&descriptor(), &user).path(),
        PathBuf::from("/home/alice/.config/systemd/user/com.myservice.service")
    );
    assert_eq!(
        UnitFile::new(&descriptor(), &root).path(),
        PathBuf::from("/etc/systemd/system/com.myservice.service")
    );
}

/// Claim: artifact identity depends only on the label.
#[test]
fn identity_follows_label() {
    let env = EnvFacts::new("alice", "/home/alice", false);
    let a = ServiceDescriptor::new("One", "com.shared", "/bin/one");
    let b = ServiceDescriptor::new("Two", "com.shared", "/bin/two");
    assert_eq!(UnitFile::new(&a, &env).path(), UnitFile::new(&b, &env).path());
    assert_eq!(PropertyList::new(&a, &env).path(), PropertyList::new(&b, &env).path());
}

fn arb_descriptor() -> impl Strategy<Value = ServiceDescriptor> {
    (
        "[A-Za-z][A-Za-z0-9 _-]{0,15}",
        "[a-z]{1,8}(\\.[a-z]{1,8}){0,3}",
        "/[a-z/]{1,20}",
        proptest::collection::vec(".{0,12}", 0..4),
        ".{0,40}",
        proptest::option::of("https://[a-z]{1,10}\\.com/[a-z]{0,10}"),
    )
        .prop_map(|(name, label, program, args, description, documentation)| {
            let mut desc = ServiceDescriptor::new(name, label, program)
                .with_args(args)
                .with_description(description);
            desc.documentation = documentation;
            desc
        })
}

proptest! {
    /// Claim: rendering is deterministic for every descriptor.
    #[test]
    fn render_is_deterministic(desc in arb_descriptor(), elevated in any::<bool>()) {
        let env = EnvFacts::new("alice", "/home/alice", elevated);
        prop_assert_eq!(
            PropertyList::new(&desc, &env).render().unwrap(),
            PropertyList::new(&desc, &env).render().unwrap()
        );
        prop_assert_eq!(
            UnitFile::new(&desc, &env).render().unwrap(),
            UnitFile::new(&desc, &env).render().unwrap()
        );
    }

    /// Claim: every rendered descriptor passes validation-independent
    /// structure checks (one ExecStart line, balanced plist).
    #[test]
    fn render_structure(desc in arb_descriptor()) {
        let env = EnvFacts::new("alice", "/home/alice", false);
        let unit = UnitFile::new(&desc, &env).render().unwrap();
        prop_assert_eq!(unit.matches("\nExecStart=").count(), 1);

        let plist = PropertyList::new(&desc, &env).render().unwrap();
        prop_assert_eq!(plist.matches("<string>").count(), plist.matches("</string>").count());
        prop_assert!(plist.ends_with("</plist>\n"));
    }
}
