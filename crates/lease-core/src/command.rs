//! Command interpreter
//!
//! dnsmasq runs the lease script as
//!
//! ```text
//! dhcp-leases init
//! dhcp-leases add <mac> [ip] [hostname] [client-id]
//! dhcp-leases del <mac> [ip] [hostname] [client-id]
//! dhcp-leases old <mac> [ip] [hostname] [client-id]
//! dhcp-leases tftp ...
//! ```
//!
//! and omits trailing values the client never sent. Positional values fill
//! the lease fields contiguously from the front. A value can also be tagged
//! as `field=value` (`mac_address`/`mac`, `ip_address`/`ip`,
//! `client_hostname`/`hostname`, `client_id`); tagged values follow the
//! positional ones and may skip fields, so a client id sent without a
//! hostname lands in `client_id` instead of the hostname slot.
//!
//! The expiry time never comes from the arguments. It is read from the
//! environment (`DNSMASQ_LEASE_EXPIRES` by default) whenever a MAC address is
//! present.

use std::collections::HashMap;

use crate::config::InterpreterConfig;
use crate::error::{Error, Result};
use crate::record::{Field, LeaseRecord};

/// Action selected by the command word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `init`, `show`: print the lease table
    Show,
    /// `add`: a lease was issued
    Add,
    /// `del`: a lease was released or expired
    Delete,
    /// `old`: a lease was renewed or re-read
    Update,
    /// `clear`: empty the lease table
    Clear,
    /// `tftp`: file transfer notification, nothing to record
    Noop,
    /// Anything else
    Unknown(String),
}

impl Action {
    /// Map a command word to an action
    pub fn parse(word: &str) -> Self {
        match word {
            "init" | "show" => Action::Show,
            "add" => Action::Add,
            "del" => Action::Delete,
            "old" => Action::Update,
            "clear" => Action::Clear,
            "tftp" => Action::Noop,
            other => Action::Unknown(other.to_string()),
        }
    }

    /// Whether the action may be given without any lease fields
    pub fn takes_no_arguments(&self) -> bool {
        matches!(self, Action::Show | Action::Clear | Action::Noop)
    }

    /// Whether the action mutates a single row and therefore needs a key
    pub fn is_keyed(&self) -> bool {
        matches!(self, Action::Add | Action::Delete | Action::Update)
    }

    /// Whether a missing expiry time is fatal for this action
    pub fn requires_expiry(&self) -> bool {
        matches!(self, Action::Add | Action::Update)
    }

    /// Name used in log output
    pub fn name(&self) -> &str {
        match self {
            Action::Show => "show",
            Action::Add => "add",
            Action::Delete => "del",
            Action::Update => "old",
            Action::Clear => "clear",
            Action::Noop => "tftp",
            Action::Unknown(word) => word,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read access to the process environment
pub trait Environment {
    /// Value of `name`, or `None` when it is not set
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A parsed invocation: what to do and with which lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: Action,
    pub record: LeaseRecord,
}

impl Invocation {
    /// Parse the script arguments (without the program name)
    ///
    /// # Errors
    ///
    /// - `Error::Usage`: no command word, no lease fields for an action that
    ///   needs them, more than four lease fields, misplaced or repeated
    ///   tagged fields
    /// - `Error::MissingEnvironment`: the expiry variable is unset for `add`
    ///   or `old`
    pub fn parse<I, S>(args: I, env: &dyn Environment, config: &InterpreterConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokens = args.into_iter().map(Into::into);
        let word = tokens
            .next()
            .ok_or_else(|| Error::usage("Error in arguments passed to dhcp_leases script"))?;
        let action = Action::parse(&word);
        let data: Vec<String> = tokens.collect();

        if data.is_empty() && !action.takes_no_arguments() {
            return Err(Error::usage(format!(
                "command '{}' requires at least a MAC address",
                word
            )));
        }

        let mut record = LeaseRecord::new();
        for (field, value) in parse_fields(&data)? {
            record.set(field, value);
        }

        if record.key().is_some() {
            match env.var(&config.expiry_var) {
                Some(expiry) => record.expiry_time = Some(expiry),
                None if action.requires_expiry() => {
                    return Err(Error::missing_environment(config.expiry_var.clone()));
                }
                None => {}
            }
        } else if action.is_keyed() {
            return Err(Error::usage(format!(
                "command '{}' requires a MAC address",
                word
            )));
        }

        Ok(Self { action, record })
    }
}

/// Parse lease field tokens into `(field, value)` pairs
///
/// One pair is returned per argument field, in positional order, with `None`
/// for fields that were not given.
pub fn parse_fields(tokens: &[String]) -> Result<Vec<(Field, Option<String>)>> {
    let mut values: [Option<String>; 4] = Default::default();
    let mut positional = 0;
    let mut tagged = false;

    for token in tokens {
        match split_tag(token) {
            Some((field, value)) => {
                tagged = true;
                let slot = field_index(field);
                if values[slot].is_some() {
                    return Err(Error::usage(format!("{} given more than once", field)));
                }
                values[slot] = Some(value.to_string());
            }
            None => {
                if tagged {
                    return Err(Error::usage(format!(
                        "positional value '{}' after a tagged field",
                        token
                    )));
                }
                if positional >= values.len() {
                    return Err(Error::usage(format!(
                        "at most {} lease fields can be given",
                        values.len()
                    )));
                }
                values[positional] = Some(token.clone());
                positional += 1;
            }
        }
    }

    Ok(Field::POSITIONAL.into_iter().zip(values).collect())
}

/// Split `field=value` when `field` names an argument field
fn split_tag(token: &str) -> Option<(Field, &str)> {
    let (tag, value) = token.split_once('=')?;
    Field::from_tag(tag).map(|field| (field, value))
}

fn field_index(field: Field) -> usize {
    Field::POSITIONAL
        .iter()
        .position(|candidate| *candidate == field)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: &str = "AA:BB:CC:DD:EE:FF";

    fn env_with_expiry(expiry: &str) -> HashMap<String, String> {
        HashMap::from([("DNSMASQ_LEASE_EXPIRES".to_string(), expiry.to_string())])
    }

    fn parse(args: &[&str], env: &HashMap<String, String>) -> Result<Invocation> {
        Invocation::parse(args.iter().copied(), env, &InterpreterConfig::default())
    }

    #[test]
    fn test_action_words() {
        assert_eq!(Action::parse("init"), Action::Show);
        assert_eq!(Action::parse("show"), Action::Show);
        assert_eq!(Action::parse("add"), Action::Add);
        assert_eq!(Action::parse("del"), Action::Delete);
        assert_eq!(Action::parse("old"), Action::Update);
        assert_eq!(Action::parse("clear"), Action::Clear);
        assert_eq!(Action::parse("tftp"), Action::Noop);
        assert_eq!(
            Action::parse("frobnicate"),
            Action::Unknown("frobnicate".to_string())
        );
    }

    #[test]
    fn test_add_with_hostname() {
        let invocation = parse(&["add", MAC, "10.0.0.5", "host1"], &env_with_expiry("123456")).unwrap();

        assert_eq!(invocation.action, Action::Add);
        assert_eq!(
            invocation.record,
            LeaseRecord::from_positional([MAC, "10.0.0.5", "host1"])
                .unwrap()
                .with_expiry_time("123456")
        );
        assert_eq!(invocation.record.client_id, None);
    }

    #[test]
    fn test_old_with_mac_only() {
        let invocation = parse(&["old", MAC], &env_with_expiry("999")).unwrap();

        assert_eq!(invocation.action, Action::Update);
        assert_eq!(invocation.record.mac_address.as_deref(), Some(MAC));
        assert_eq!(invocation.record.expiry_time.as_deref(), Some("999"));
        assert_eq!(invocation.record.ip_address, None);
        assert_eq!(invocation.record.client_hostname, None);
        assert_eq!(invocation.record.client_id, None);
    }

    #[test]
    fn test_zero_argument_actions() {
        let env = HashMap::new();
        for word in ["init", "show", "clear", "tftp"] {
            let invocation = parse(&[word], &env).unwrap();
            assert_eq!(invocation.record, LeaseRecord::new());
        }
    }

    #[test]
    fn test_keyed_action_without_arguments() {
        let env = env_with_expiry("1");
        for word in ["add", "del", "old", "frobnicate"] {
            let err = parse(&[word], &env).unwrap_err();
            assert!(matches!(err, Error::Usage(_)), "{} -> {:?}", word, err);
        }
    }

    #[test]
    fn test_no_arguments_at_all() {
        let err = parse(&[], &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_too_many_arguments() {
        let err = parse(&["add", MAC, "10.0.0.5", "h", "id", "extra"], &env_with_expiry("1"))
            .unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_missing_expiry_is_fatal_for_add_and_old() {
        let env = HashMap::new();
        for word in ["add", "old"] {
            let err = parse(&[word, MAC], &env).unwrap_err();
            assert!(matches!(err, Error::MissingEnvironment(ref var) if var == "DNSMASQ_LEASE_EXPIRES"));
        }
    }

    #[test]
    fn test_missing_expiry_allowed_for_del() {
        let invocation = parse(&["del", MAC, "10.0.0.5"], &HashMap::new()).unwrap();
        assert_eq!(invocation.action, Action::Delete);
        assert_eq!(invocation.record.expiry_time, None);
    }

    #[test]
    fn test_unknown_command_with_arguments_parses() {
        let invocation = parse(&["frobnicate", MAC], &env_with_expiry("1")).unwrap();
        assert_eq!(invocation.action, Action::Unknown("frobnicate".to_string()));
    }

    #[test]
    fn test_tagged_client_id_without_hostname() {
        let invocation = parse(
            &["add", MAC, "10.0.0.5", "client_id=01:aa:bb"],
            &env_with_expiry("5"),
        )
        .unwrap();

        assert_eq!(invocation.record.client_hostname, None);
        assert_eq!(invocation.record.client_id.as_deref(), Some("01:aa:bb"));
    }

    #[test]
    fn test_positional_client_id_is_taken_as_hostname() {
        // Without a tag the third value is always the hostname
        let invocation = parse(&["add", MAC, "10.0.0.5", "01:aa:bb"], &env_with_expiry("5")).unwrap();
        assert_eq!(invocation.record.client_hostname.as_deref(), Some("01:aa:bb"));
        assert_eq!(invocation.record.client_id, None);
    }

    #[test]
    fn test_tagged_then_positional_rejected() {
        let tokens = vec!["mac=aa".to_string(), "10.0.0.5".to_string()];
        assert!(matches!(parse_fields(&tokens), Err(Error::Usage(_))));
    }

    #[test]
    fn test_tagged_field_repeated_rejected() {
        let tokens = vec![MAC.to_string(), "mac_address=aa".to_string()];
        assert!(matches!(parse_fields(&tokens), Err(Error::Usage(_))));
    }

    #[test]
    fn test_tagged_without_mac_rejected_for_add() {
        let err = parse(&["add", "ip=10.0.0.5"], &env_with_expiry("5")).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
    }

    #[test]
    fn test_untagged_equals_sign_is_positional() {
        let tokens = vec![MAC.to_string(), "10.0.0.5".to_string(), "a=b".to_string()];
        let fields = parse_fields(&tokens).unwrap();
        assert_eq!(fields[2], (Field::ClientHostname, Some("a=b".to_string())));
        assert_eq!(fields[3], (Field::ClientId, None));
    }

    #[test]
    fn test_custom_expiry_variable() {
        let config = InterpreterConfig {
            expiry_var: "DNSMASQ_LEASE_LENGTH".to_string(),
        };
        let env = HashMap::from([("DNSMASQ_LEASE_LENGTH".to_string(), "3600".to_string())]);
        let invocation = Invocation::parse(["add", MAC], &env, &config).unwrap();
        assert_eq!(invocation.record.expiry_time.as_deref(), Some("3600"));
    }
}
