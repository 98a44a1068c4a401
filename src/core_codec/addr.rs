use crate::error::FtpError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Parse the six-tuple `h1,h2,h3,h4,ph,pl` form shared by PORT arguments
/// and PASV reply bodies.
pub fn parse_host_port(s: &str) -> Result<SocketAddr, FtpError> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 6 {
        return Err(FtpError::InvalidSyntax);
    }
    let mut b = [0u8; 6];
    for (i, part) in parts.iter().enumerate() {
        b[i] = part.parse().map_err(|_| FtpError::InvalidSyntax)?;
    }
    let ip = Ipv4Addr::new(b[0], b[1], b[2], b[3]);
    let port = u16::from(b[4]) << 8 | u16::from(b[5]);
    Ok(SocketAddr::from((ip, port)))
}

/// Extract an address from a PORT command argument.
pub fn parse_port(s: &str) -> Result<SocketAddr, FtpError> {
    parse_host_port(s)
}

/// Extract an address from a PASV reply message.
pub fn parse_pasv(msg: &str) -> Result<SocketAddr, FtpError> {
    parse_host_port(deparen(msg))
}

/// Extract a port from an EPSV reply message.
pub fn parse_epsv(msg: &str) -> Result<u16, FtpError> {
    let (proto, host, port) = split_eaddr(deparen(msg))?;
    if !proto.is_empty() || !host.is_empty() {
        return Err(FtpError::InvalidSyntax);
    }
    port.parse().map_err(|_| FtpError::InvalidSyntax)
}

/// Extract an address from an EPRT command argument.
pub fn parse_eprt(msg: &str) -> Result<SocketAddr, FtpError> {
    let (proto, host, port) = split_eaddr(msg)?;
    let port: u16 = port.parse().map_err(|_| FtpError::InvalidSyntax)?;
    let ip: IpAddr = match proto {
        "1" => host
            .parse::<Ipv4Addr>()
            .map_err(|_| FtpError::InvalidSyntax)?
            .into(),
        "2" => host
            .parse::<Ipv6Addr>()
            .map_err(|_| FtpError::InvalidSyntax)?
            .into(),
        _ => return Err(FtpError::InvalidSyntax),
    };
    Ok(SocketAddr::new(ip, port))
}

/// Format `addr` as the six-tuple used with PASV and PORT. Only IPv4
/// addresses (including IPv4-mapped IPv6) can be encoded this way.
pub fn host_port(addr: &SocketAddr) -> Result<String, FtpError> {
    let ip = match addr.ip() {
        IpAddr::V4(ip) => ip,
        IpAddr::V6(ip) => ip
            .to_ipv4_mapped()
            .ok_or(FtpError::Unsupported("unsupported address"))?,
    };
    let o = ip.octets();
    Ok(format!(
        "{},{},{},{},{},{}",
        o[0],
        o[1],
        o[2],
        o[3],
        addr.port() / 256,
        addr.port() % 256
    ))
}

/// Format `addr` for use with EPRT. `d` is the field delimiter: either ""
/// (in which case "|" is used) or a single ASCII character in the inclusive
/// range between '!' and '~' that occurs in none of the fields.
pub fn ehost_port(d: &str, addr: &SocketAddr) -> Result<String, FtpError> {
    let d = if d.is_empty() { "|" } else { d };
    if !valid_delimiter(d) {
        return Err(FtpError::InvalidSyntax);
    }
    let (proto, host) = match addr.ip() {
        IpAddr::V4(ip) => ("1", ip.to_string()),
        IpAddr::V6(ip) => ("2", ip.to_string()),
    };
    let port = addr.port().to_string();
    for field in [proto, host.as_str(), port.as_str()] {
        if field.contains(d) {
            return Err(FtpError::InvalidSyntax);
        }
    }
    Ok(format!("{d}{proto}{d}{host}{d}{port}{d}"))
}

/// Split a `<d>net<d>host<d>port<d>` extended address into its fields.
fn split_eaddr(s: &str) -> Result<(&str, &str, &str), FtpError> {
    if s.len() < 2 || !s.as_bytes()[0].is_ascii() {
        return Err(FtpError::InvalidSyntax);
    }
    let d = &s[..1];
    if !valid_delimiter(d) || !s.ends_with(d) {
        return Err(FtpError::InvalidSyntax);
    }
    let split: Vec<&str> = s[1..s.len() - 1].split(d).collect();
    if split.len() != 3 {
        return Err(FtpError::InvalidSyntax);
    }
    Ok((split[0], split[1], split[2]))
}

fn valid_delimiter(d: &str) -> bool {
    d.len() == 1 && (b'!'..=b'~').contains(&d.as_bytes()[0])
}

/// Extract the contents of the outermost pair of parentheses.
fn deparen(s: &str) -> &str {
    match (s.find('('), s.rfind(')')) {
        (Some(a), Some(z)) if a < z => &s[a + 1..z],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_port_round_trip() {
        let addr: SocketAddr = "10.1.2.3:6001".parse().unwrap();
        let encoded = host_port(&addr).unwrap();
        assert_eq!(encoded, "10,1,2,3,23,113");
        assert_eq!(parse_host_port(&encoded).unwrap(), addr);
    }

    #[test]
    fn host_port_rejects_plain_ipv6() {
        let addr: SocketAddr = "[2001:db8::1]:21".parse().unwrap();
        assert!(host_port(&addr).is_err());
    }

    #[test]
    fn parse_host_port_syntax_errors() {
        assert!(parse_host_port("1,2,3").is_err());
        assert!(parse_host_port("1,2,3,4,5,260").is_err());
        assert!(parse_host_port("a,b,c,d,e,f").is_err());
    }

    #[test]
    fn parse_pasv_extracts_parens() {
        let addr = parse_pasv("Entering Passive Mode (127,0,0,1,4,1).").unwrap();
        assert_eq!(addr, "127.0.0.1:1025".parse().unwrap());
        assert!(parse_pasv("no parens here").is_err());
    }

    #[test]
    fn eprt_round_trip() {
        let v4: SocketAddr = "1.2.3.4:2121".parse().unwrap();
        assert_eq!(ehost_port("", &v4).unwrap(), "|1|1.2.3.4|2121|");
        assert_eq!(parse_eprt("|1|1.2.3.4|2121|").unwrap(), v4);

        let v6: SocketAddr = "[2001:db8::1]:2121".parse().unwrap();
        let encoded = ehost_port("|", &v6).unwrap();
        assert_eq!(parse_eprt(&encoded).unwrap(), v6);
    }

    #[test]
    fn eprt_custom_delimiter() {
        let v4: SocketAddr = "1.2.3.4:21".parse().unwrap();
        assert_eq!(ehost_port("!", &v4).unwrap(), "!1!1.2.3.4!21!");
        // A delimiter occurring inside a field is refused.
        assert!(ehost_port(".", &v4).is_err());
        assert!(ehost_port("ab", &v4).is_err());
    }

    #[test]
    fn parse_eprt_rejects_unknown_protocols() {
        assert!(parse_eprt("|9|1.2.3.4|21|").is_err());
        assert!(parse_eprt("|1|2001:db8::1|21|").is_err());
        assert!(parse_eprt("|1|1.2.3.4|21").is_err());
        assert!(parse_eprt("||").is_err());
    }

    #[test]
    fn parse_epsv_port_only() {
        assert_eq!(
            parse_epsv("Entering Extended Passive Mode (|||6446|)").unwrap(),
            6446
        );
        assert!(parse_epsv("(|1||6446|)").is_err());
    }
}
