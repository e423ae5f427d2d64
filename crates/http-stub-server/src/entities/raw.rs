use std::path::Path;

use super::{Method, Response};
use crate::error::RawResponseError;

const MAX_HEADERS: usize = 64;

/// Read a captured HTTP response (status line, headers, body) from disk.
/// `method` is the method of the request the capture answers.
pub fn read_raw_response(path: &Path, method: Method) -> Result<Response, RawResponseError> {
    let bytes = std::fs::read(path).map_err(|source| RawResponseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_raw_response(&bytes, method)
}

/// Parse a captured HTTP/1.x response.
///
/// The body is framed by `Content-Length` or chunked encoding when present and
/// runs to the end of input otherwise. Replies to `HEAD` and 1xx, 204 and 304
/// responses have an empty body whatever their headers say. Framing headers
/// are dropped from the result since the body is re-framed when served.
pub fn parse_raw_response(bytes: &[u8], method: Method) -> Result<Response, RawResponseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut headers);
    let offset = match parsed.parse(bytes)? {
        httparse::Status::Complete(offset) => offset,
        httparse::Status::Partial => return Err(RawResponseError::Incomplete),
    };
    let status = parsed.code.ok_or(RawResponseError::Incomplete)?;

    let mut response = Response::new(status);
    let mut content_length = None;
    let mut chunked = false;
    for header in parsed.headers.iter() {
        let value = String::from_utf8_lossy(header.value).trim().to_string();
        if header.name.eq_ignore_ascii_case("content-length") {
            let length = value
                .parse::<usize>()
                .map_err(|_| RawResponseError::ContentLength)?;
            content_length = Some(length);
        } else if header.name.eq_ignore_ascii_case("transfer-encoding") {
            chunked = value.to_ascii_lowercase().ends_with("chunked");
        } else {
            response.headers.push((header.name.to_string(), value));
        }
    }

    let rest = &bytes[offset..];
    response.body = if !has_body(status, method) {
        Vec::new()
    } else if chunked {
        dechunk(rest)?
    } else if let Some(expected) = content_length {
        if rest.len() < expected {
            return Err(RawResponseError::Truncated {
                expected,
                actual: rest.len(),
            });
        }
        rest[..expected].to_vec()
    } else {
        rest.to_vec()
    };

    Ok(response)
}

fn has_body(status: u16, method: Method) -> bool {
    method != Method::Head && !(100..200).contains(&status) && status != 204 && status != 304
}

fn dechunk(mut input: &[u8]) -> Result<Vec<u8>, RawResponseError> {
    let mut body = Vec::new();
    loop {
        let (start, size) = match httparse::parse_chunk_size(input)
            .map_err(|_| RawResponseError::Incomplete)?
        {
            httparse::Status::Complete(parsed) => parsed,
            httparse::Status::Partial => return Err(RawResponseError::Incomplete),
        };
        if size == 0 {
            return Ok(body);
        }

        let size = usize::try_from(size).map_err(|_| RawResponseError::ContentLength)?;
        let chunk = &input[start..];
        if chunk.len() < size {
            return Err(RawResponseError::Truncated {
                expected: size,
                actual: chunk.len(),
            });
        }
        body.extend_from_slice(&chunk[..size]);

        input = &chunk[size..];
        input = input
            .strip_prefix(b"\r\n")
            .or_else(|| input.strip_prefix(b"\n"))
            .unwrap_or(input);
    }
}
