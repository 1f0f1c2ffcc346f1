use crypto_reader::{FileRole, LoadErrorKind, LoadRequest, Loader, load};
use rcgen::{CertificateParams, KeyPair};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A self-signed host certificate, its key and a few CA certificates on disk.
struct Fixture {
    dir: TempDir,
    cert: PathBuf,
    key: PathBuf,
    cas: Vec<PathBuf>,
}

impl Fixture {
    fn new(ca_count: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let (cert_pem, key_pem) = self_signed("hosta.test");
        let cert = write(dir.path(), "hosta.crt", &cert_pem);
        let key = write(dir.path(), "hosta.key", &key_pem);

        let cas = (0..ca_count)
            .map(|i| {
                let (pem, _) = self_signed(&format!("ca{}.test", i));
                write(dir.path(), &format!("ca{}.crt", i), &pem)
            })
            .collect();

        Self { dir, cert, key, cas }
    }

    fn missing(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn request(&self) -> LoadRequest {
        LoadRequest::new(&self.cert, &self.key)
    }
}

fn self_signed(name: &str) -> (String, String) {
    let key_pair = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec![name.to_string()])
        .unwrap()
        .self_signed(&key_pair)
        .unwrap();
    (cert.pem(), key_pair.serialize_pem())
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn first_der(path: &Path) -> Vec<u8> {
    let pem = fs::read(path).unwrap();
    let mut reader = pem.as_slice();
    rustls_pemfile::certs(&mut reader)
        .next()
        .unwrap()
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_absent_request() {
    let err = load(None).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::MissingRequest);
}

#[tokio::test]
async fn test_missing_cert_path() {
    let err = load(&LoadRequest::default()).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::MissingCertPath);
}

#[tokio::test]
async fn test_missing_key_path() {
    let fixture = Fixture::new(0);
    let err = load(&LoadRequest::new(&fixture.cert, "")).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::MissingKeyPath);
}

#[tokio::test]
async fn test_cert_file_does_not_exist() {
    let fixture = Fixture::new(0);
    let invalid = fixture.missing("hosta.crt.invalid");

    let err = load(&LoadRequest::new(&invalid, &fixture.key)).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::FileRead);
    assert_eq!(err.role(), Some(FileRole::Cert));
    assert_eq!(err.path(), Some(invalid.as_path()));
    assert_eq!(
        err.to_string(),
        format!("unable to read crt file: {}", invalid.display())
    );
}

#[tokio::test]
async fn test_key_file_does_not_exist() {
    let fixture = Fixture::new(0);
    let invalid = fixture.missing("hosta.key.invalid");

    let err = load(&LoadRequest::new(&fixture.cert, &invalid)).await.unwrap_err();
    assert_eq!(err.role(), Some(FileRole::Key));
    assert_eq!(err.path(), Some(invalid.as_path()));
    assert_eq!(
        err.to_string(),
        format!("unable to read key file: {}", invalid.display())
    );
}

#[tokio::test]
async fn test_creates_credential_without_ca() {
    let fixture = Fixture::new(0);

    let credential = load(&fixture.request()).await.unwrap();
    assert_eq!(credential.cert_chain().len(), 1);
    assert!(credential.ca_certs().is_empty());
}

#[tokio::test]
async fn test_accepts_single_ca_file() {
    let fixture = Fixture::new(1);

    let credential = load(&fixture.request().with_ca(&fixture.cas[0])).await.unwrap();
    assert_eq!(credential.ca_certs().len(), 1);
    assert_eq!(credential.ca_certs()[0].as_ref(), first_der(&fixture.cas[0]));
}

#[tokio::test]
async fn test_single_ca_file_does_not_exist() {
    let fixture = Fixture::new(0);
    let invalid = fixture.missing("ca.crt.invalid");

    let err = load(&fixture.request().with_ca(&invalid)).await.unwrap_err();
    assert_eq!(err.role(), Some(FileRole::Ca));
    assert_eq!(
        err.to_string(),
        format!("unable to read ca file: {}", invalid.display())
    );
}

#[tokio::test]
async fn test_ca_list_with_invalid_entry() {
    let fixture = Fixture::new(1);
    let invalid = fixture.missing("ca.crt.invalid");

    let request = fixture
        .request()
        .with_ca_paths([fixture.cas[0].clone(), invalid.clone()]);
    let err = load(&request).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::FileRead);
    assert_eq!(err.path(), Some(invalid.as_path()));
}

#[tokio::test]
async fn test_ca_list_keeps_request_order() {
    let fixture = Fixture::new(4);

    let credential = load(&fixture.request().with_ca_paths(&fixture.cas))
        .await
        .unwrap();

    let expected: Vec<Vec<u8>> = fixture.cas.iter().map(|p| first_der(p)).collect();
    let actual: Vec<Vec<u8>> = credential.ca_certs().iter().map(|c| c.to_vec()).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_key_file_without_key_is_construction_error() {
    let fixture = Fixture::new(0);

    // A certificate where the key should be.
    let err = load(&LoadRequest::new(&fixture.cert, &fixture.cert)).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::CredentialConstruction);
}

#[tokio::test]
async fn test_key_from_other_pair_is_construction_error() {
    let fixture = Fixture::new(0);
    let (_, other_key) = self_signed("hostb.test");
    let other_key = write(fixture.dir.path(), "hostb.key", &other_key);

    let err = load(&LoadRequest::new(&fixture.cert, &other_key)).await.unwrap_err();
    assert_eq!(err.kind(), LoadErrorKind::CredentialConstruction);
    assert_eq!(
        err.to_string(),
        "unable to construct credential: private key does not match certificate"
    );
}

#[tokio::test]
async fn test_empty_ca_in_config_means_no_ca() {
    let fixture = Fixture::new(0);
    let config = format!(
        "crt = {:?}\nkey = {:?}\nca = \"\"\n",
        fixture.cert.display().to_string(),
        fixture.key.display().to_string(),
    );

    let request = LoadRequest::from_toml_str(&config).unwrap();
    let credential = load(&request).await.unwrap();
    assert!(credential.ca_certs().is_empty());
}

#[tokio::test]
async fn test_repeated_loads_are_independent() {
    let fixture = Fixture::new(2);
    let request = fixture.request().with_ca_paths(&fixture.cas);
    let loader = Loader::new();

    let (first, second) = tokio::join!(loader.load(&request), loader.load(&request));
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.cert_chain(), second.cert_chain());
    assert_eq!(first.ca_certs(), second.ca_certs());
    assert_eq!(
        first.private_key().secret_der(),
        second.private_key().secret_der()
    );
    assert!(!std::sync::Arc::ptr_eq(
        &first.certified_key(),
        &second.certified_key()
    ));
}

#[tokio::test]
async fn test_spawned_load_from_toml_config() {
    let fixture = Fixture::new(1);
    let config = write(
        fixture.dir.path(),
        "crypto-reader.toml",
        &format!(
            "crt = {:?}\nkey = {:?}\nca = {:?}\n",
            fixture.cert.display().to_string(),
            fixture.key.display().to_string(),
            fixture.cas[0].display().to_string(),
        ),
    );

    let request = LoadRequest::from_file(&config).unwrap();
    let credential = Loader::new().spawn(Some(request)).await.unwrap().unwrap();

    assert_eq!(credential.ca_certs().len(), 1);
    assert!(credential.server_config().is_ok());
    assert!(credential.client_config().is_ok());
}
