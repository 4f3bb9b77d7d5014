use anyhow::Result;
use slog::Logger;

use authplug_backend::Access;
use authplug_backend::AccessMatch;
use authplug_backend::BackendFixture;
use authplug_backend::BackendFixtureFactory;
use authplug_backend::FixtureUser;
use authplug_conf::Conf;
use authplug_hash::VerifierFixture;

use super::errors::BackendConfInvalid;
use super::errors::BackendInitFailed;
use super::errors::BackendNotFound;
use super::errors::ChainEmpty;
use super::errors::ChainTooLong;
use super::errors::DuplicateBackend;
use super::errors::GlobalAclInvalid;
use super::errors::SuperusersPatternInvalid;
use super::AuthPlug;
use super::AuthPlugArgs;
use super::Backends;
use super::Decision;
use super::GlobalAcl;
use super::Grantor;

fn logger() -> Logger {
    Logger::root(slog::Discard, slog::o!())
}

fn conf(backends: &[&str]) -> Conf {
    Conf {
        backends: backends.iter().map(|name| name.to_string()).collect(),
        ..Conf::default()
    }
}

fn registry(fixtures: &[(&str, &BackendFixture)]) -> Backends {
    let mut backends = Backends::empty();
    for (name, fixture) in fixtures {
        let factory = BackendFixtureFactory::new((*fixture).clone());
        backends.register(*name, factory);
    }
    backends
}

fn initialise(conf: &Conf, backends: &Backends) -> Result<AuthPlug> {
    AuthPlug::initialise(AuthPlugArgs {
        backends,
        conf,
        logger: logger(),
        verifier: Box::new(VerifierFixture),
    })
}

#[test]
fn empty_inputs_consult_no_backend() {
    let backend = BackendFixture::default();
    backend
        .user("bob", FixtureUser::Password("secret".into()))
        .superuser("bob");
    let backends = registry(&[("a", &backend)]);
    let plug = initialise(&conf(&["a"]), &backends).unwrap();

    assert_eq!(plug.authenticate("", "secret"), Decision::Denied);
    assert_eq!(plug.authenticate("bob", ""), Decision::Denied);
    assert_eq!(plug.authorise("", "bob", "a/b", Access::READ), Decision::Denied);
    assert_eq!(plug.authorise("c1", "", "a/b", Access::READ), Decision::Denied);
    assert_eq!(plug.authorise("c1", "bob", "", Access::READ), Decision::Denied);
    assert!(backend.calls().is_empty());
}

#[test]
fn global_superuser_bypasses_chain() {
    let backend = BackendFixture::default();
    let backends = registry(&[("a", &backend)]);
    let mut conf = conf(&["a"]);
    conf.superusers = Some("admin*".into());
    conf.superusers_password = Some("root-secret".into());
    let plug = initialise(&conf, &backends).unwrap();

    let decision = plug.authenticate("admin-eu", "root-secret");
    assert_eq!(decision, Decision::Allowed(Grantor::GlobalSuperuser));
    assert!(backend.calls().is_empty());

    assert_eq!(plug.authenticate("admin-eu", "guess"), Decision::Denied);
    assert_eq!(plug.authenticate("bob", "root-secret"), Decision::Denied);
    assert_eq!(
        backend.calls(),
        vec!["authenticate:admin-eu", "authenticate:bob"]
    );
}

#[test]
fn superuser_pattern_without_password() {
    let backend = BackendFixture::default();
    let backends = registry(&[("a", &backend)]);
    let mut conf = conf(&["a"]);
    conf.superusers = Some("admin*".into());
    let plug = initialise(&conf, &backends).unwrap();

    assert_eq!(plug.authenticate("admin", "anything"), Decision::Denied);
    let decision = plug.authorise("c1", "admin", "any/topic", Access::WRITE);
    assert_eq!(decision, Decision::Allowed(Grantor::GlobalSuperuser));
    assert_eq!(backend.calls(), vec!["authenticate:admin"]);
}

#[test]
fn first_authenticating_backend_wins() {
    let be_a = BackendFixture::default();
    be_a.user("bob", FixtureUser::Password("pa".into()));
    let be_b = BackendFixture::default();
    be_b.user("bob", FixtureUser::Hash("pb".into()));
    let backends = registry(&[("beA", &be_a), ("beB", &be_b)]);

    let plug = initialise(&conf(&["beA", "beB"]), &backends).unwrap();
    let decision = plug.authenticate("bob", "pa");
    assert_eq!(decision, Decision::Allowed(Grantor::Backend("beA".into())));
    assert!(be_b.calls().is_empty());
    plug.shutdown();

    let plug = initialise(&conf(&["beB", "beA"]), &backends).unwrap();
    let decision = plug.authenticate("bob", "pa");
    assert_eq!(decision, Decision::Allowed(Grantor::Backend("beA".into())));
    assert_eq!(be_b.calls(), vec!["shutdown", "authenticate:bob"]);
}

#[test]
fn hash_verified_by_later_backend() {
    let be_a = BackendFixture::default();
    let be_b = BackendFixture::default();
    be_b.user("bob", FixtureUser::Hash("H".into()));
    let backends = registry(&[("beA", &be_a), ("beB", &be_b)]);
    let plug = initialise(&conf(&["beA", "beB"]), &backends).unwrap();

    let decision = plug.authenticate("bob", "H");
    assert_eq!(decision, Decision::Allowed(Grantor::Backend("beB".into())));
    assert_eq!(plug.authenticate("bob", "wrong"), Decision::Denied);
    assert_eq!(be_a.calls(), vec!["authenticate:bob", "authenticate:bob"]);
    assert_eq!(be_b.calls(), vec!["authenticate:bob", "authenticate:bob"]);
}

#[test]
fn failing_backend_is_skipped() {
    let be_a = BackendFixture::default();
    be_a.failing();
    let be_b = BackendFixture::default();
    be_b.user("bob", FixtureUser::Password("secret".into()))
        .acl("bob", "a/b", Access::READ);
    let backends = registry(&[("beA", &be_a), ("beB", &be_b)]);
    let plug = initialise(&conf(&["beA", "beB"]), &backends).unwrap();

    let decision = plug.authenticate("bob", "secret");
    assert_eq!(decision, Decision::Allowed(Grantor::Backend("beB".into())));
    let decision = plug.authorise("c1", "bob", "a/b", Access::READ);
    assert_eq!(decision, Decision::Allowed(Grantor::Backend("beB".into())));
    assert_eq!(
        plug.authorise("c1", "bob", "a/c", Access::READ),
        Decision::Denied
    );
}

#[test]
fn global_acl_checks_access() {
    let backend = BackendFixture::default();
    let backends = registry(&[("a", &backend)]);
    let mut conf = conf(&["a"]);
    conf.global_acl_pattern = Some("read sensors/%c/#".into());
    let plug = initialise(&conf, &backends).unwrap();

    let decision = plug.authorise("dev1", "bob", "sensors/dev1/temp", Access::READ);
    assert_eq!(decision, Decision::Allowed(Grantor::GlobalAcl));
    let decision = plug.authorise("dev1", "bob", "sensors/dev1/temp", Access::WRITE);
    assert_eq!(decision, Decision::Denied);
    let decision = plug.authorise("dev1", "bob", "sensors/dev2/temp", Access::READ);
    assert_eq!(decision, Decision::Denied);
}

#[test]
fn global_acl_access_match_modes() {
    let backend = BackendFixture::default();
    let backends = registry(&[("a", &backend)]);
    let mut conf = conf(&["a"]);
    conf.global_acl_pattern = Some("read sensors/#".into());

    let plug = initialise(&conf, &backends).unwrap();
    let decision = plug.authorise("c1", "bob", "sensors/t", Access::READ_WRITE);
    assert_eq!(decision, Decision::Allowed(Grantor::GlobalAcl));
    plug.shutdown();

    conf.acl_access_match = AccessMatch::All;
    let plug = initialise(&conf, &backends).unwrap();
    let decision = plug.authorise("c1", "bob", "sensors/t", Access::READ_WRITE);
    assert_eq!(decision, Decision::Denied);
    let decision = plug.authorise("c1", "bob", "sensors/t", Access::READ);
    assert_eq!(decision, Decision::Allowed(Grantor::GlobalAcl));
}

#[test]
fn backend_superusers_checked_before_acls() {
    let be_a = BackendFixture::default();
    be_a.acl("bob", "a/b", Access::READ);
    let be_b = BackendFixture::default();
    be_b.superuser("bob");
    let backends = registry(&[("beA", &be_a), ("beB", &be_b)]);
    let plug = initialise(&conf(&["beA", "beB"]), &backends).unwrap();

    let decision = plug.authorise("c1", "bob", "a/b", Access::READ);
    assert_eq!(decision, Decision::Allowed(Grantor::Superuser("beB".into())));
    assert_eq!(be_a.calls(), vec!["superuser:bob"]);
    assert_eq!(be_b.calls(), vec!["superuser:bob"]);
}

#[test]
fn backend_acls_checked_in_order() {
    let be_a = BackendFixture::default();
    let be_b = BackendFixture::default();
    be_b.acl("bob", "a/b", Access::READ_WRITE);
    let backends = registry(&[("beA", &be_a), ("beB", &be_b)]);
    let plug = initialise(&conf(&["beA", "beB"]), &backends).unwrap();

    let decision = plug.authorise("c1", "bob", "a/b", Access::WRITE);
    assert_eq!(decision, Decision::Allowed(Grantor::Backend("beB".into())));
    assert_eq!(be_a.calls(), vec!["superuser:bob", "acl_check:bob:a/b"]);
    assert_eq!(be_b.calls(), vec!["superuser:bob", "acl_check:bob:a/b"]);
}

#[test]
fn repeated_decisions_are_stable() {
    let backend = BackendFixture::default();
    backend.acl("bob", "a/b", Access::READ);
    let backends = registry(&[("a", &backend)]);
    let plug = initialise(&conf(&["a"]), &backends).unwrap();

    let first = plug.authorise("c1", "bob", "a/b", Access::READ);
    for _ in 0..5 {
        assert_eq!(plug.authorise("c1", "bob", "a/b", Access::READ), first);
    }
    assert!(first.is_allowed());
}

#[test]
fn shutdown_releases_backends_once() {
    let backend = BackendFixture::default();
    let backends = registry(&[("a", &backend)]);

    let plug = initialise(&conf(&["a"]), &backends).unwrap();
    plug.shutdown();
    assert_eq!(backend.shutdowns(), 1);

    let plug = initialise(&conf(&["a"]), &backends).unwrap();
    drop(plug);
    assert_eq!(backend.shutdowns(), 2);
}

mod fatal {
    use super::*;

    #[test]
    fn no_backends() {
        let backends = Backends::empty();
        let error = initialise(&conf(&[]), &backends).err().unwrap();
        assert!(error.is::<ChainEmpty>());
    }

    #[test]
    fn unknown_backend() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let error = initialise(&conf(&["a", "ldap"]), &backends).err().unwrap();
        assert!(error.is::<BackendNotFound>());
        assert_eq!(backend.shutdowns(), 1);
    }

    #[test]
    fn backend_conf_rejected() {
        let mut factory = BackendFixtureFactory::default();
        factory.fail_conf = true;
        let mut backends = Backends::empty();
        backends.register("a", factory);
        let error = initialise(&conf(&["a"]), &backends).err().unwrap();
        assert!(error.is::<BackendConfInvalid>());
    }

    #[test]
    fn backend_init_failed() {
        let first = BackendFixture::default();
        let mut factory = BackendFixtureFactory::default();
        factory.fail_init = true;
        let mut backends = registry(&[("a", &first)]);
        backends.register("b", factory);

        let error = initialise(&conf(&["a", "b"]), &backends).err().unwrap();
        assert!(error.is::<BackendInitFailed>());
        assert_eq!(first.shutdowns(), 1);
    }

    #[test]
    fn duplicate_backend() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let error = initialise(&conf(&["a", "a"]), &backends).err().unwrap();
        assert!(error.is::<DuplicateBackend>());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn too_many_backends() {
        let backend = BackendFixture::default();
        let names = ["a", "b", "c", "d", "e", "f"];
        let fixtures: Vec<(&str, &BackendFixture)> =
            names.iter().map(|name| (*name, &backend)).collect();
        let backends = registry(&fixtures);

        let error = initialise(&conf(&names), &backends).err().unwrap();
        let error = error.downcast_ref::<ChainTooLong>().unwrap();
        assert_eq!(error.count, 6);
        assert_eq!(error.max, crate::MAX_BACKENDS);
        assert!(initialise(&conf(&names[..5]), &backends).is_ok());
    }

    #[test]
    fn global_acl_without_access() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let mut conf = conf(&["a"]);
        conf.global_acl_pattern = Some("subscribe sensors/#".into());
        let error = initialise(&conf, &backends).err().unwrap();
        match error.downcast_ref::<GlobalAclInvalid>() {
            Some(GlobalAclInvalid::NoAccess(_)) => (),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn superusers_pattern_invalid() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let mut conf = conf(&["a"]);
        conf.superusers = Some("admin[".into());
        let error = initialise(&conf, &backends).err().unwrap();
        assert!(error.is::<SuperusersPatternInvalid>());
    }
}

mod global_acl {
    use super::*;

    #[test]
    fn parse_access_list() {
        let acl = GlobalAcl::parse("read,write sensors/%c/#", &logger()).unwrap();
        assert_eq!(acl.access, Access::READ_WRITE);
        assert_eq!(acl.topic, "sensors/%c/#");
    }

    #[test]
    fn parse_ignores_unknown_tokens() {
        let acl = GlobalAcl::parse("read,subscribe  users/%u", &logger()).unwrap();
        assert_eq!(acl.access, Access::READ);
        assert_eq!(acl.topic, "users/%u");
    }

    #[test]
    fn parse_errors() {
        let cases = [
            ("", "NoTopic"),
            ("read", "NoTopic"),
            ("read a/b extra", "TrailingFields"),
            ("write a/#/b", "Topic"),
            (",, a/b", "NoAccess"),
        ];
        for (pattern, expected) in cases {
            let error = GlobalAcl::parse(pattern, &logger()).unwrap_err();
            let actual = match error.downcast_ref::<GlobalAclInvalid>() {
                Some(GlobalAclInvalid::NoAccess(_)) => "NoAccess",
                Some(GlobalAclInvalid::NoTopic(_)) => "NoTopic",
                Some(GlobalAclInvalid::Topic(_)) => "Topic",
                Some(GlobalAclInvalid::TrailingFields(_)) => "TrailingFields",
                None => "other",
            };
            assert_eq!(actual, expected, "pattern: {:?}", pattern);
        }
    }
}

#[cfg(feature = "psk")]
mod psk {
    use super::*;
    use crate::errors::PskDatabaseMissing;
    use crate::errors::PskDatabaseUnknown;
    use crate::PSK_BACKEND;

    fn psk_conf(backends: &[&str], database: &str) -> Conf {
        let mut conf = conf(backends);
        conf.psk_database = Some(database.into());
        conf
    }

    #[test]
    fn provider_placed_first() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let plug = initialise(&psk_conf(&["a", "psk"], "a"), &backends).unwrap();
        assert_eq!(plug.chain().names(), vec![PSK_BACKEND, "a"]);
    }

    #[test]
    fn provider_never_authenticates() {
        let backend = BackendFixture::default();
        backend.user("dev", FixtureUser::Password("secret".into()));
        let backends = registry(&[("a", &backend)]);
        let plug = initialise(&psk_conf(&["psk", "a"], "a"), &backends).unwrap();

        let decision = plug.authenticate("dev", "secret");
        assert_eq!(decision, Decision::Allowed(Grantor::Backend("a".into())));
        assert_eq!(backend.calls(), vec!["authenticate:dev"]);
    }

    #[test]
    fn provider_borrows_authorisation() {
        let backend = BackendFixture::default();
        backend.superuser("dev");
        let backends = registry(&[("a", &backend)]);
        let plug = initialise(&psk_conf(&["psk", "a"], "a"), &backends).unwrap();

        let decision = plug.authorise("c1", "dev", "a/b", Access::READ);
        assert_eq!(decision, Decision::Allowed(Grantor::Superuser("psk".into())));
    }

    #[test]
    fn fetch_key_truncated() {
        let backend = BackendFixture::default();
        backend.psk("dev", "0123456789abcdef");
        let backends = registry(&[("a", &backend)]);
        let plug = initialise(&psk_conf(&["psk", "a"], "a"), &backends).unwrap();

        let key = plug.fetch_psk_key("hint", "dev", 64);
        assert_eq!(key, Some(b"0123456789abcdef".to_vec()));
        let key = plug.fetch_psk_key("hint", "dev", 4);
        assert_eq!(key, Some(b"0123".to_vec()));
        assert_eq!(plug.fetch_psk_key("hint", "dev", 0), None);
        assert_eq!(plug.fetch_psk_key("hint", "", 64), None);
        assert_eq!(plug.fetch_psk_key("hint", "other", 64), None);
    }

    #[test]
    fn fetch_key_without_provider() {
        let backend = BackendFixture::default();
        backend.psk("dev", "0123456789abcdef");
        let backends = registry(&[("a", &backend)]);
        let plug = initialise(&psk_conf(&["a"], "a"), &backends).unwrap();
        assert_eq!(plug.fetch_psk_key("hint", "dev", 64), None);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn shared_backend_released_once() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let plug = initialise(&psk_conf(&["psk", "a"], "a"), &backends).unwrap();
        plug.shutdown();
        assert_eq!(backend.shutdowns(), 1);
    }

    #[test]
    fn database_missing() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let error = initialise(&conf(&["psk", "a"]), &backends).err().unwrap();
        assert!(error.is::<PskDatabaseMissing>());
    }

    #[test]
    fn database_unknown() {
        let backend = BackendFixture::default();
        let backends = registry(&[("a", &backend)]);
        let error = initialise(&psk_conf(&["psk", "a"], "b"), &backends)
            .err()
            .unwrap();
        assert!(error.is::<PskDatabaseUnknown>());
    }

    #[test]
    fn provider_not_counted_in_chain_limit() {
        let backend = BackendFixture::default();
        let names = ["psk", "a", "b", "c", "d", "e"];
        let fixtures: Vec<(&str, &BackendFixture)> =
            names[1..].iter().map(|name| (*name, &backend)).collect();
        let backends = registry(&fixtures);
        let plug = initialise(&psk_conf(&names, "a"), &backends).unwrap();
        assert_eq!(plug.chain().len(), 6);
    }

    #[test]
    #[should_panic(expected = "backend name 'psk' is reserved")]
    fn provider_name_reserved() {
        let mut backends = Backends::empty();
        backends.register(PSK_BACKEND, BackendFixtureFactory::default());
    }
}
