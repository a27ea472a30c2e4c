//! HTTPS targets: reqwest opens a CONNECT tunnel through the proxy and runs
//! TLS inside it. The fake proxies here answer CONNECT themselves and, when
//! they accept it, terminate TLS with a test certificate for `probe.test`.

use proxy_probe::proxy::{
    CheckerConfig, Disposition, HttpProber, NullSink, Prober, ProxyChecker, ProxyParser,
    ProxyRecord, ProxyType,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

const TARGET: &str = "https://probe.test/";

/// Base64 of `alice:secret`, lowercased like the rest of the request head
const ALICE_BASIC: &str = "proxy-authorization: basic ywxpy2u6c2vjcmv0";

#[derive(Clone, Copy)]
enum Connect {
    /// Answer the CONNECT itself with this status
    Refuse(u16),
    /// Read the CONNECT and close the connection
    HangUp,
    /// Accept the CONNECT and never answer
    Silent,
    /// Open the tunnel and answer the inner request with `status`
    Tunnel { status: u16, require_auth: bool },
}

fn tls_acceptor() -> TlsAcceptor {
    let certs = rustls_pemfile::certs(&mut &include_bytes!("fixtures/server.pem")[..])
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let key = rustls_pemfile::private_key(&mut &include_bytes!("fixtures/server.key")[..])
        .unwrap()
        .unwrap();

    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(certs, key)
    .unwrap();

    TlsAcceptor::from(Arc::new(config))
}

/// Read one request head, up to the blank line
async fn read_head<S: AsyncRead + Unpin>(stream: &mut S) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).to_lowercase()
}

async fn spawn_tunnel_proxy(behavior: Connect) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let acceptor = tls_acceptor();

    tokio::spawn(async move {
        let mut held = Vec::new();
        loop {
            let (mut stream, _) = listener.accept().await.unwrap();
            if let Connect::Silent = behavior {
                held.push(stream);
                continue;
            }

            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let head = read_head(&mut stream).await;
                assert!(head.starts_with("connect probe.test:443"), "{}", head);

                let (status, require_auth) = match behavior {
                    Connect::Refuse(code) => {
                        let reply =
                            format!("HTTP/1.1 {} Refused\r\ncontent-length: 0\r\n\r\n", code);
                        let _ = stream.write_all(reply.as_bytes()).await;
                        return;
                    }
                    Connect::HangUp | Connect::Silent => return,
                    Connect::Tunnel {
                        status,
                        require_auth,
                    } => (status, require_auth),
                };

                if require_auth && !head.contains(ALICE_BASIC) {
                    let _ = stream
                        .write_all(
                            b"HTTP/1.1 407 Proxy Authentication Required\r\n\
                              proxy-authenticate: Basic realm=\"test\"\r\n\
                              content-length: 0\r\n\r\n",
                        )
                        .await;
                    return;
                }

                let _ = stream
                    .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                    .await;

                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let inner = read_head(&mut tls).await;
                assert!(inner.starts_with("get / http/1.1"), "{}", inner);

                let reply = format!(
                    "HTTP/1.1 {} Fake\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    status
                );
                let _ = tls.write_all(reply.as_bytes()).await;
                let _ = tls.shutdown().await;
            });
        }
    });

    port
}

fn config(timeout: Duration) -> CheckerConfig {
    CheckerConfig::new()
        .with_test_url(TARGET.to_string())
        .with_timeout(timeout)
        .with_root_certificate(include_bytes!("fixtures/ca.pem").to_vec())
}

async fn outcome_through(behavior: Connect) -> (Disposition, i32) {
    let port = spawn_tunnel_proxy(behavior).await;
    let prober = HttpProber::new(config(Duration::from_secs(3)));
    let outcome = prober
        .probe(&ProxyRecord::new("127.0.0.1", port.to_string()))
        .await
        .unwrap();
    (outcome.disposition(), outcome.status_code())
}

#[tokio::test]
async fn test_tunnel_carries_the_target_status() {
    let ok = Connect::Tunnel {
        status: 200,
        require_auth: false,
    };
    assert_eq!(outcome_through(ok).await, (Disposition::Working, 200));
}

#[tokio::test]
async fn test_target_rejection_inside_tunnel_is_suspect() {
    let forbidden = Connect::Tunnel {
        status: 403,
        require_auth: false,
    };
    assert_eq!(outcome_through(forbidden).await, (Disposition::Suspect, 403));
}

#[tokio::test]
async fn test_refused_connect_is_failed() {
    assert_eq!(
        outcome_through(Connect::Refuse(403)).await,
        (Disposition::Failed, -1)
    );
    assert_eq!(
        outcome_through(Connect::Refuse(502)).await,
        (Disposition::Failed, -1)
    );
}

#[tokio::test]
async fn test_connect_auth_challenge_is_failed() {
    let needs_auth = Connect::Tunnel {
        status: 200,
        require_auth: true,
    };
    assert_eq!(outcome_through(needs_auth).await, (Disposition::Failed, -1));
}

#[tokio::test]
async fn test_connection_dropped_after_connect_is_failed() {
    assert_eq!(
        outcome_through(Connect::HangUp).await,
        (Disposition::Failed, -1)
    );
}

#[tokio::test]
async fn test_untrusted_target_certificate_is_failed() {
    let port = spawn_tunnel_proxy(Connect::Tunnel {
        status: 200,
        require_auth: false,
    })
    .await;
    let prober = HttpProber::new(
        CheckerConfig::new()
            .with_test_url(TARGET.to_string())
            .with_timeout(Duration::from_secs(3)),
    );

    let outcome = prober
        .probe(&ProxyRecord::new("127.0.0.1", port.to_string()))
        .await
        .unwrap();
    assert!(!outcome.transport_ok());
    assert_eq!(outcome.status_code(), -1);
}

#[tokio::test]
async fn test_timed_out_proxy_is_bad_and_authenticated_tunnel_is_good() {
    let silent = spawn_tunnel_proxy(Connect::Silent).await;
    let authed = spawn_tunnel_proxy(Connect::Tunnel {
        status: 200,
        require_auth: true,
    })
    .await;

    let content = format!("127.0.0.1:{}\n127.0.0.1:{}:alice:secret\n", silent, authed);
    let records = ProxyParser::parse_string(&content, ProxyType::Http);

    let summary = ProxyChecker::with_config(config(Duration::from_secs(3)))
        .run(records, NullSink)
        .await
        .unwrap();

    assert_eq!(summary.good, vec![format!("127.0.0.1:{}:alice:secret", authed)]);
    assert_eq!(summary.bad, vec![format!("127.0.0.1:{}", silent)]);
}
