//! Request-scoped brokerage session.
//!
//! A `Session` owns one SDK handle for the lifetime of a single scan request. It
//! checks credentials before each SDK call, maps SDK failures onto `ScannerError`, and
//! logs out when dropped, so every exit path of the owning scope tears the session down
//! exactly once. Logout failures are reported to the observer and never propagated.
use chrono::NaiveDate;

use crate::broker::{Account, BrokerApi, ScanQuery};
use crate::config::{API_KEY, CA_PASSWD, CA_PATH, Config, SECRET_KEY};
use crate::error::{BrokerError, ScannerError};
use crate::observer::{ScanEvent, ScanObserver};
use crate::record::ScanRecord;
use crate::result::Result;
use crate::scanner_type::ScannerType;
use crate::usage::UsageSnapshot;

/// One SDK handle bound to a credentials set.
pub struct Session<'o> {
    api: Box<dyn BrokerApi>,
    config: Config,
    simulation: bool,
    logged_in: bool,
    observer: &'o dyn ScanObserver,
}

impl<'o> Session<'o> {
    /// Wrap `api`. Nothing is sent to the brokerage until [`Self::login`].
    pub fn new(
        api: Box<dyn BrokerApi>,
        config: Config,
        simulation: bool,
        observer: &'o dyn ScanObserver,
    ) -> Self {
        Self {
            api,
            config,
            simulation,
            logged_in: false,
            observer,
        }
    }

    /// Log in with `API_KEY`/`SECRET_KEY`.
    pub fn login(&mut self) -> Result<Vec<Account>> {
        let api_key = self.config.require(API_KEY)?;
        let secret_key = self.config.require(SECRET_KEY)?;

        let accounts = self
            .api
            .login(api_key, secret_key)
            .map_err(|e| ScannerError::AuthenticationFailed(e.to_string()))?;
        self.logged_in = true;
        self.observer.notify(&ScanEvent::LoggedIn {
            accounts: accounts.len(),
        });
        Ok(accounts)
    }

    /// Activate the certificate at `CA_PATH` with `CA_PASSWD`.
    pub fn activate_certificate(&mut self) -> Result<()> {
        let ca_path = self.config.require(CA_PATH)?;
        let ca_passwd = self.config.require(CA_PASSWD)?;

        self.api
            .activate_ca(ca_path, ca_passwd)
            .map_err(|e| ScannerError::CertificateActivationFailed(e.to_string()))?;
        self.observer.notify(&ScanEvent::CertificateActivated);
        Ok(())
    }

    /// Current quota snapshot, or `None` if the brokerage could not report it.
    pub fn usage(&mut self) -> Option<UsageSnapshot> {
        match self.api.usage() {
            Ok(status) => {
                let snapshot = UsageSnapshot::from(status);
                self.observer.notify(&ScanEvent::UsageChecked(&snapshot));
                Some(snapshot)
            }
            Err(e) => {
                self.observer
                    .notify(&ScanEvent::UsageUnavailable(&e.to_string()));
                None
            }
        }
    }

    /// Run a ranking scan. Requires a successful [`Self::login`].
    pub fn scan(
        &mut self,
        scanner_type: ScannerType,
        date: NaiveDate,
        count: u16,
        ascending: bool,
        timeout_ms: u64,
    ) -> Result<Vec<ScanRecord>> {
        if !self.logged_in {
            return Err(ScannerError::NotLoggedIn);
        }
        let query = ScanQuery {
            scanner_type,
            date,
            count,
            ascending,
            timeout_ms,
        };

        let records = self
            .api
            .scanners(&query)
            .map_err(|e| match e {
                BrokerError::Timeout(ms) => ScannerError::ScanTimeout(ms),
                other => ScannerError::ScanFailed(other.to_string()),
            })?
            .unwrap_or_default();
        self.observer.notify(&ScanEvent::Scanned {
            records: records.len(),
        });
        Ok(records)
    }

    /// End the brokerage session. No-op unless logged in; never fails.
    pub fn logout(&mut self) {
        if !self.logged_in {
            return;
        }
        self.logged_in = false;
        match self.api.logout() {
            Ok(()) => self.observer.notify(&ScanEvent::LoggedOut),
            Err(e) => self
                .observer
                .notify(&ScanEvent::LogoutFailed(&e.to_string())),
        }
    }

    /// Whether login succeeded and logout has not run yet.
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Whether the session targets the paper-trading environment.
    pub fn is_simulation(&self) -> bool {
        self.simulation
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::QuotaStatus;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Calls {
        login: usize,
        scanners: usize,
        logout: usize,
    }

    struct FakeApi {
        calls: Arc<Mutex<Calls>>,
        scan_result: std::result::Result<Option<Vec<ScanRecord>>, BrokerError>,
        usage_result: std::result::Result<QuotaStatus, BrokerError>,
        logout_result: std::result::Result<(), BrokerError>,
    }

    impl FakeApi {
        fn new(calls: Arc<Mutex<Calls>>) -> Self {
            Self {
                calls,
                scan_result: Ok(Some(vec![ScanRecord::new().with("code", "2330")])),
                usage_result: Ok(QuotaStatus {
                    bytes: 10,
                    limit_bytes: 100,
                }),
                logout_result: Ok(()),
            }
        }
    }

    impl BrokerApi for FakeApi {
        fn login(&mut self, _: &str, _: &str) -> std::result::Result<Vec<Account>, BrokerError> {
            self.calls.lock().unwrap().login += 1;
            Ok(Vec::new())
        }

        fn activate_ca(&mut self, _: &str, _: &str) -> std::result::Result<(), BrokerError> {
            Ok(())
        }

        fn usage(&mut self) -> std::result::Result<QuotaStatus, BrokerError> {
            self.usage_result.clone()
        }

        fn scanners(
            &mut self,
            _: &ScanQuery,
        ) -> std::result::Result<Option<Vec<ScanRecord>>, BrokerError> {
            self.calls.lock().unwrap().scanners += 1;
            self.scan_result.clone()
        }

        fn logout(&mut self) -> std::result::Result<(), BrokerError> {
            self.calls.lock().unwrap().logout += 1;
            self.logout_result.clone()
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ScanObserver for Recorder {
        fn notify(&self, event: &ScanEvent<'_>) {
            self.0.lock().unwrap().push(format!("{:?}", event));
        }
    }

    fn full_config() -> Config {
        [
            (API_KEY, "key"),
            (SECRET_KEY, "secret"),
            (CA_PATH, "/tmp/ca.pfx"),
            (CA_PASSWD, "pw"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
    }

    #[test]
    fn scan_before_login_is_not_logged_in() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let observer = Recorder::default();
        let mut session = Session::new(
            Box::new(FakeApi::new(calls.clone())),
            full_config(),
            true,
            &observer,
        );

        let err = session
            .scan(ScannerType::VolumeRank, date(), 10, true, 1_000)
            .unwrap_err();
        assert!(matches!(err, ScannerError::NotLoggedIn));
        drop(session);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.scanners, 0);
        assert_eq!(calls.logout, 0);
    }

    #[test]
    fn missing_secret_fails_before_sdk_login() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let observer = Recorder::default();
        let config: Config = [("API_KEY".to_string(), "key".to_string())]
            .into_iter()
            .collect();
        let mut session = Session::new(Box::new(FakeApi::new(calls.clone())), config, true, &observer);

        assert!(matches!(
            session.login(),
            Err(ScannerError::MissingCredential(key)) if key == SECRET_KEY
        ));
        assert!(!session.is_logged_in());
        assert_eq!(calls.lock().unwrap().login, 0);
    }

    #[test]
    fn none_result_becomes_empty_and_timeout_is_mapped() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let observer = Recorder::default();
        let mut api = FakeApi::new(calls.clone());
        api.scan_result = Ok(None);
        let mut session = Session::new(Box::new(api), full_config(), true, &observer);
        session.login().unwrap();
        assert!(session
            .scan(ScannerType::VolumeRank, date(), 10, true, 1_000)
            .unwrap()
            .is_empty());

        let mut api = FakeApi::new(calls.clone());
        api.scan_result = Err(BrokerError::Timeout(1_000));
        let mut session = Session::new(Box::new(api), full_config(), true, &observer);
        session.login().unwrap();
        assert!(matches!(
            session.scan(ScannerType::VolumeRank, date(), 10, true, 1_000),
            Err(ScannerError::ScanTimeout(1_000))
        ));

        let mut api = FakeApi::new(calls);
        api.scan_result = Err(BrokerError::Rejected("bad type".into()));
        let mut session = Session::new(Box::new(api), full_config(), true, &observer);
        session.login().unwrap();
        assert!(matches!(
            session.scan(ScannerType::VolumeRank, date(), 10, true, 1_000),
            Err(ScannerError::ScanFailed(msg)) if msg.contains("bad type")
        ));
    }

    #[test]
    fn usage_failure_is_none() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let observer = Recorder::default();
        let mut api = FakeApi::new(calls);
        api.usage_result = Err(BrokerError::Disconnected("reset".into()));
        let mut session = Session::new(Box::new(api), full_config(), true, &observer);

        assert!(session.usage().is_none());
        assert!(observer.0.lock().unwrap()[0].contains("UsageUnavailable"));
    }

    #[test]
    fn logout_runs_once_and_swallows_errors() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let observer = Recorder::default();
        let mut api = FakeApi::new(calls.clone());
        api.logout_result = Err(BrokerError::Disconnected("gone".into()));
        let mut session = Session::new(Box::new(api), full_config(), true, &observer);
        session.login().unwrap();

        session.logout();
        session.logout();
        drop(session);

        assert_eq!(calls.lock().unwrap().logout, 1);
        let events = observer.0.lock().unwrap();
        assert!(events.iter().any(|e| e.contains("LogoutFailed")));
    }

    #[test]
    fn drop_logs_out() {
        let calls = Arc::new(Mutex::new(Calls::default()));
        let observer = Recorder::default();
        {
            let mut session =
                Session::new(Box::new(FakeApi::new(calls.clone())), full_config(), false, &observer);
            session.login().unwrap();
            assert!(!session.is_simulation());
        }
        assert_eq!(calls.lock().unwrap().logout, 1);
    }
}
