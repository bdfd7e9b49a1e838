// Ordered-candidate fallback resolution.
//
// Vendor deployments are inconsistent: the same controller may answer on
// different ports, path prefixes, or header spellings. Both the controller
// client and the gateway enricher drive their trial-and-error through the
// same helper: try each candidate in order, short-circuit on the first
// success, and keep only the most recent failure.

use crate::error::Error;

/// Try each candidate in order, returning the first success.
///
/// On total failure, returns the last error seen (the most recent failure
/// message is the most useful one to surface). An empty candidate list is
/// reported as [`Error::NotFound`].
pub async fn first_success<C, T, F, Fut>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
) -> Result<T, Error>
where
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut last_err = None;
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or(Error::NotFound {
        message: "no candidates to try".into(),
    }))
}

/// Normalize a configured base address into an ordered candidate list.
///
/// Ensures a scheme (`https://` by default), strips trailing slashes, and
/// -- when no port was given -- fans out to the common controller ports
/// `8443` and `443` after the bare address.
pub fn candidate_bases(addr: &str) -> Vec<String> {
    let trimmed = addr.trim();
    let mut base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };
    while base.ends_with('/') {
        base.pop();
    }

    let mut bases = vec![base.clone()];
    if !has_explicit_port(&base) {
        bases.push(format!("{base}:8443"));
        bases.push(format!("{base}:443"));
    }
    bases
}

fn has_explicit_port(base: &str) -> bool {
    let rest = base.split_once("://").map_or(base, |(_, r)| r);
    match rest.rsplit_once(':') {
        Some((_, port)) => !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bases_fan_out_ports_when_unspecified() {
        let bases = candidate_bases("192.168.1.1");
        assert_eq!(
            bases,
            vec![
                "https://192.168.1.1".to_owned(),
                "https://192.168.1.1:8443".to_owned(),
                "https://192.168.1.1:443".to_owned(),
            ]
        );
    }

    #[test]
    fn bases_keep_explicit_port_as_single_candidate() {
        let bases = candidate_bases("https://10.0.0.1:8443/");
        assert_eq!(bases, vec!["https://10.0.0.1:8443".to_owned()]);
    }

    #[test]
    fn bases_preserve_http_scheme() {
        let bases = candidate_bases(" http://gw.local ");
        assert_eq!(bases[0], "http://gw.local");
        assert_eq!(bases.len(), 3);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let tried = std::cell::RefCell::new(Vec::new());
        let result = first_success([1u32, 2, 3], |n| {
            tried.borrow_mut().push(n);
            async move {
                if n == 2 {
                    Ok(n * 10)
                } else {
                    Err(Error::NotFound {
                        message: format!("candidate {n}"),
                    })
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some(20));
        assert_eq!(*tried.borrow(), vec![1, 2]);
    }

    #[tokio::test]
    async fn first_success_reports_last_error() {
        let result: Result<(), _> = first_success([1u32, 2], |n| async move {
            Err(Error::NotFound {
                message: format!("candidate {n}"),
            })
        })
        .await;

        let err = result.expect_err("all candidates fail");
        assert!(err.to_string().contains("candidate 2"));
    }

    #[tokio::test]
    async fn first_success_empty_list_is_not_found() {
        let result: Result<(), _> =
            first_success(Vec::<u32>::new(), |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }
}
