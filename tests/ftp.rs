//! End-to-end scenarios: a real server on a loopback listener, driven either
//! by the crate's own client or by a raw control connection where the exact
//! wire traffic matters.

mod common;

use common::MemFs;
use ferroftp::core_codec::{parse_epsv, parse_pasv};
use ferroftp::{AuthFn, Authorizer, Client, FileHandler, MapAuthorizer, Reply, Server};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

async fn start_server(fs: MemFs, authorizer: Option<Arc<dyn Authorizer>>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut handler = FileHandler::new(Arc::new(fs));
    handler.authorizer = authorizer;
    let server = Server::new(Arc::new(handler));
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    addr
}

fn map_auth(user: &str, pass: &str) -> Arc<dyn Authorizer> {
    Arc::new(MapAuthorizer(HashMap::from([(
        user.to_string(),
        pass.to_string(),
    )])))
}

/// A raw control connection for asserting exact codes and wire formats.
struct RawControl {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl RawControl {
    async fn connect(addr: SocketAddr) -> RawControl {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (r, w) = stream.into_split();
        let mut control = RawControl {
            reader: BufReader::new(r),
            writer: w,
        };
        let greeting = control.read_reply().await;
        assert_eq!(greeting.code, 220);
        control
    }

    async fn login(addr: SocketAddr) -> RawControl {
        let mut control = RawControl::connect(addr).await;
        assert_eq!(control.cmd("USER anonymous").await.code, 331);
        assert_eq!(control.cmd("PASS x").await.code, 230);
        control
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .unwrap();
    }

    async fn read_reply(&mut self) -> Reply {
        Reply::decode(&mut self.reader).await.unwrap()
    }

    async fn cmd(&mut self, line: &str) -> Reply {
        self.send(line).await;
        self.read_reply().await
    }

    /// PASV, then dial the advertised six-tuple.
    async fn pasv_dial(&mut self) -> TcpStream {
        let reply = self.cmd("PASV").await;
        assert_eq!(reply.code, 227);
        let addr = parse_pasv(&reply.msg).unwrap();
        TcpStream::connect(addr).await.unwrap()
    }
}

async fn read_all(mut stream: TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn store_and_read() {
    let fs = MemFs::new();
    let addr = start_server(fs.clone(), Some(map_auth("foo", "bar"))).await;

    let mut c = Client::connect(&addr.to_string()).await.unwrap();
    assert!(!c.authorize("admin", "password1").await.unwrap());
    assert!(c.authorize("foo", "bar").await.unwrap());

    let mut f = c.create("foo.txt");
    f.write_all(b"wow cool").await.unwrap();
    f.close().await.unwrap();

    let mut f = c.open("foo.txt");
    let mut got = Vec::new();
    f.read_to_end(&mut got).await.unwrap();
    f.close().await.unwrap();
    assert_eq!(got, b"wow cool");

    assert_eq!(fs.contents("/foo.txt").unwrap(), b"wow cool");
    c.quit().await.unwrap();
}

#[tokio::test]
async fn anonymous_login() {
    let addr = start_server(MemFs::new(), None).await;

    let mut c = Client::connect(&addr.to_string()).await.unwrap();
    assert!(!c.authorize("root", "hunter2").await.unwrap());
    assert!(c.authorize("anonymous", "anything").await.unwrap());
    c.quit().await.unwrap();

    // The exact codes of the sub-protocol.
    let mut raw = RawControl::connect(addr).await;
    assert_eq!(raw.cmd("USER anonymous").await.code, 331);
    assert_eq!(raw.cmd("PASS whatever").await.code, 230);
    assert_eq!(raw.cmd("QUIT").await.code, 211);
}

#[tokio::test]
async fn store_then_retrieve_over_pasv() {
    let addr = start_server(MemFs::new(), None).await;
    let mut raw = RawControl::login(addr).await;

    assert_eq!(raw.cmd("TYPE I").await.code, 200);

    let mut data = raw.pasv_dial().await;
    raw.send("STOR foo.txt").await;
    assert_eq!(raw.read_reply().await.code, 150);
    data.write_all(b"wow cool").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert_eq!(raw.read_reply().await.code, 226);

    let data = raw.pasv_dial().await;
    raw.send("RETR foo.txt").await;
    assert_eq!(raw.read_reply().await.code, 150);
    assert_eq!(read_all(data).await, b"wow cool");
    assert_eq!(raw.read_reply().await.code, 226);
}

#[tokio::test]
async fn listings() {
    let fs = MemFs::new();
    fs.add_file("/a.txt", b"hello");
    fs.add_dir("/d");
    let addr = start_server(fs, None).await;

    // NLST through the client.
    let mut c = Client::connect(&addr.to_string()).await.unwrap();
    assert!(c.authorize("anonymous", "x").await.unwrap());
    let mut dir = c.open("/");
    assert_eq!(dir.readdir().await.unwrap(), vec!["a.txt", "d"]);
    dir.close().await.unwrap();
    c.quit().await.unwrap();

    // LIST long form over a raw connection.
    let mut raw = RawControl::login(addr).await;
    let data = raw.pasv_dial().await;
    raw.send("LIST /").await;
    assert_eq!(raw.read_reply().await.code, 150);
    let listing = String::from_utf8(read_all(data).await).unwrap();
    assert_eq!(raw.read_reply().await.code, 226);

    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "total 2");
    assert!(lines[1].starts_with("-rw-r--r-- 1"));
    assert!(lines[1].ends_with(" a.txt"));
    assert!(lines[2].starts_with("drwxr-xr-x 1"));
    assert!(lines[2].ends_with(" d"));

    // An empty directory lists as just the header, and NLST as nothing.
    let data = raw.pasv_dial().await;
    raw.send("LIST /d").await;
    assert_eq!(raw.read_reply().await.code, 150);
    assert_eq!(read_all(data).await, b"total 0\n");
    assert_eq!(raw.read_reply().await.code, 226);

    let data = raw.pasv_dial().await;
    raw.send("NLST /d").await;
    assert_eq!(raw.read_reply().await.code, 150);
    assert_eq!(read_all(data).await, b"");
    assert_eq!(raw.read_reply().await.code, 226);
}

#[tokio::test]
async fn rename_requires_an_immediate_rnfr() {
    let fs = MemFs::new();
    fs.add_file("/a.txt", b"hello");
    let addr = start_server(fs, None).await;
    let mut raw = RawControl::login(addr).await;

    // Any intervening command clears the rename source.
    assert_eq!(raw.cmd("RNFR /a.txt").await.code, 350);
    assert_eq!(raw.cmd("NOOP").await.code, 200);
    assert_eq!(raw.cmd("RNTO /b.txt").await.code, 503);

    // Back to back, the transaction commits.
    assert_eq!(raw.cmd("RNFR /a.txt").await.code, 350);
    assert_eq!(raw.cmd("RNTO /b.txt").await.code, 250);
    assert_eq!(raw.cmd("SIZE /b.txt").await.code, 213);
    assert_eq!(raw.cmd("SIZE /a.txt").await.code, 550);
}

#[tokio::test]
async fn client_rename_and_remove() {
    let fs = MemFs::new();
    fs.add_file("/a.txt", b"hello");
    let addr = start_server(fs.clone(), None).await;

    let mut c = Client::connect(&addr.to_string()).await.unwrap();
    assert!(c.authorize("anonymous", "x").await.unwrap());
    c.rename("/a.txt", "/b.txt").await.unwrap();
    assert!(fs.contents("/a.txt").is_none());
    assert_eq!(fs.contents("/b.txt").unwrap(), b"hello");

    c.remove("/b.txt").await.unwrap();
    assert!(fs.contents("/b.txt").is_none());
    assert!(c.remove("/b.txt").await.is_err());
    c.quit().await.unwrap();
}

#[tokio::test]
async fn client_mkdir_and_chdir() {
    let fs = MemFs::new();
    let addr = start_server(fs.clone(), None).await;

    let mut c = Client::connect(&addr.to_string()).await.unwrap();
    assert!(c.authorize("anonymous", "x").await.unwrap());
    c.mkdir("/inbox").await.unwrap();
    c.chdir("/inbox").await.unwrap();

    // Relative paths now resolve under the new working directory.
    let mut f = c.create("note.txt");
    f.write_all(b"hi").await.unwrap();
    f.close().await.unwrap();
    assert_eq!(fs.contents("/inbox/note.txt").unwrap(), b"hi");

    assert!(c.chdir("/missing").await.is_err());
    c.quit().await.unwrap();
}

#[tokio::test]
async fn epsv_all_is_a_latch() {
    let addr = start_server(MemFs::new(), None).await;
    let mut raw = RawControl::login(addr).await;

    assert_eq!(raw.cmd("EPSV ALL").await.code, 200);
    assert!(raw.cmd("PASV").await.is_permanent());
    assert!(raw.cmd("PORT 127,0,0,1,4,1").await.is_permanent());
    assert!(raw.cmd("EPRT |1|127.0.0.1|1025|").await.is_permanent());

    let reply = raw.cmd("EPSV 1").await;
    assert_eq!(reply.code, 229);
    let port = parse_epsv(&reply.msg).unwrap();
    assert_ne!(port, 0);
}

#[tokio::test]
async fn address_syntax_errors() {
    let addr = start_server(MemFs::new(), None).await;
    let mut raw = RawControl::login(addr).await;

    assert_eq!(raw.cmd("PORT 1,2,3").await.code, 501);
    assert_eq!(raw.cmd("PORT 1,2,3,4,5,999").await.code, 501);
    assert_eq!(raw.cmd("EPRT |9|1.2.3.4|21|").await.code, 501);
    assert_eq!(raw.cmd("EPRT nonsense").await.code, 501);

    // A well-formed EPRT against a live local listener succeeds.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let reply = raw.cmd(&format!("EPRT |1|127.0.0.1|{port}|")).await;
    assert_eq!(reply.code, 227);
    let (_stream, _) = listener.accept().await.unwrap();
}

#[tokio::test]
async fn retrieve_honors_a_start_seek() {
    let fs = MemFs::new();
    fs.add_file("/foo.txt", b"wow cool");
    let addr = start_server(fs, None).await;

    let mut c = Client::connect(&addr.to_string()).await.unwrap();
    assert!(c.authorize("anonymous", "x").await.unwrap());

    let mut f = c.open("/foo.txt");
    f.seek(SeekFrom::Start(4)).unwrap();
    let mut got = Vec::new();
    f.read_to_end(&mut got).await.unwrap();
    assert_eq!(got, b"cool");

    // Seeking after the transfer started, or relative seeks, are refused.
    let mut f = c.open("/foo.txt");
    assert!(f.seek(SeekFrom::End(0)).is_err());
    let mut buf = [0u8; 3];
    f.read(&mut buf).await.unwrap();
    assert!(f.seek(SeekFrom::Start(0)).is_err());
    f.close().await.unwrap();
    c.quit().await.unwrap();
}

#[tokio::test]
async fn ascii_type_translates_line_endings() {
    let fs = MemFs::new();
    fs.add_file("/lines.txt", b"a\nb\r\nc");
    let addr = start_server(fs, None).await;
    let mut raw = RawControl::login(addr).await;

    assert_eq!(raw.cmd("TYPE A").await.code, 200);
    let data = raw.pasv_dial().await;
    raw.send("RETR /lines.txt").await;
    assert_eq!(raw.read_reply().await.code, 150);
    assert_eq!(read_all(data).await, b"a\r\nb\r\nc");
    assert_eq!(raw.read_reply().await.code, 226);

    // Binary type passes the same bytes through unchanged.
    assert_eq!(raw.cmd("TYPE I").await.code, 200);
    let data = raw.pasv_dial().await;
    raw.send("RETR /lines.txt").await;
    assert_eq!(raw.read_reply().await.code, 150);
    assert_eq!(read_all(data).await, b"a\nb\r\nc");
    assert_eq!(raw.read_reply().await.code, 226);
}

#[tokio::test]
async fn teardown_replies_421_to_a_pending_command() {
    let boom: Arc<dyn Authorizer> = Arc::new(AuthFn(|_: &str, _: &str| {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
    }));
    let addr = start_server(MemFs::new(), Some(boom)).await;

    let mut raw = RawControl::connect(addr).await;
    assert_eq!(raw.cmd("USER someone").await.code, 331);
    // The authorizer blows up; the server tears the session down, answering
    // the pending PASS with a 421 goodbye first.
    assert_eq!(raw.cmd("PASS pw").await.code, 421);
}

#[tokio::test]
async fn command_grab_bag() {
    let fs = MemFs::new();
    fs.add_file("/a.txt", b"hello");
    fs.add_dir("/d");
    let addr = start_server(fs, None).await;
    let mut raw = RawControl::login(addr).await;

    let syst = raw.cmd("SYST").await;
    assert_eq!((syst.code, syst.msg.as_str()), (215, "UNIX Type: L8"));

    assert_eq!(raw.cmd("PWD").await.msg, "/");
    assert_eq!(raw.cmd("CWD /d").await.code, 250);
    assert_eq!(raw.cmd("PWD").await.msg, "/d");
    assert_eq!(raw.cmd("CDUP").await.code, 250);
    assert_eq!(raw.cmd("PWD").await.msg, "/");
    assert_eq!(raw.cmd("CWD /missing").await.code, 550);
    assert_eq!(raw.cmd("CWD /a.txt").await.code, 550);

    let mkd = raw.cmd("MKD sub").await;
    assert_eq!(mkd.code, 257);
    assert!(mkd.msg.contains("\"sub\""));
    assert_eq!(raw.cmd("MKD sub").await.code, 550);

    assert_eq!(raw.cmd("SIZE /a.txt").await.msg, "5");
    assert_eq!(raw.cmd("SIZE /d").await.code, 550);
    let mdtm = raw.cmd("MDTM /a.txt").await;
    assert_eq!(mdtm.code, 213);
    assert_eq!(mdtm.msg.len(), 14);
    assert!(mdtm.msg.chars().all(|c| c.is_ascii_digit()));

    assert_eq!(raw.cmd("DELE").await.code, 501);
    assert_eq!(raw.cmd("DELE /missing").await.code, 550);
    assert_eq!(raw.cmd("RMD /sub").await.code, 250);

    assert_eq!(raw.cmd("TYPE E").await.code, 504);
    assert_eq!(raw.cmd("TYPE X").await.code, 504);
    assert_eq!(raw.cmd("MODE B").await.code, 504);
    assert_eq!(raw.cmd("MODE S").await.code, 200);

    assert_eq!(raw.cmd("USER again").await.code, 530);
    assert_eq!(raw.cmd("PASS again").await.code, 230);
    assert_eq!(raw.cmd("FEAT").await.code, 502);

    // Transfer verbs demand a data channel.
    assert_eq!(raw.cmd("RETR /a.txt").await.code, 425);
    assert_eq!(raw.cmd("STOR /b.txt").await.code, 425);
    assert_eq!(raw.cmd("LIST").await.code, 425);

    assert_eq!(raw.cmd("QUIT").await.code, 211);
}
