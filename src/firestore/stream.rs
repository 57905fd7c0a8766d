use super::models::{RunQueryRequest, RunQueryResponse};
use super::snapshot::DocumentSnapshot;
use super::FirestoreError;
use crate::core::parse_error_response;
use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, Stream};
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

/// Documents returned by a `runQuery` call, decoded as the response body arrives.
///
/// The body is a single JSON array whose elements are `RunQueryResponse` objects. Elements
/// that carry no document (progress reports holding only a `readTime`) are consumed
/// silently. The first error ends the stream.
pub struct DocumentStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    buffer: BytesMut,
    opened: bool,
    done: bool,
    read_time: Option<String>,
}

enum Element {
    Object(BytesMut),
    NeedMore,
    End,
}

impl DocumentStream {
    pub fn new(inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            opened: false,
            done: false,
            read_time: None,
        }
    }

    /// The latest read time reported by the server so far.
    pub fn read_time(&self) -> Option<&str> {
        self.read_time.as_deref()
    }

    fn skip_whitespace(&mut self, and_commas: bool) {
        let n = self
            .buffer
            .iter()
            .take_while(|b| b.is_ascii_whitespace() || (and_commas && **b == b','))
            .count();
        self.buffer.advance(n);
    }

    fn next_element(&mut self) -> Result<Element, FirestoreError> {
        if !self.opened {
            self.skip_whitespace(false);
            match self.buffer.first() {
                None => return Ok(Element::NeedMore),
                Some(b'[') => {
                    self.buffer.advance(1);
                    self.opened = true;
                }
                Some(_) => {
                    return Err(FirestoreError::ApiError(
                        "Run query response is not a JSON array".into(),
                    ))
                }
            }
        }

        self.skip_whitespace(true);
        match self.buffer.first() {
            None => Ok(Element::NeedMore),
            Some(b']') => {
                self.buffer.advance(1);
                Ok(Element::End)
            }
            Some(_) => Ok(match find_json_boundary(&self.buffer) {
                Some(len) => Element::Object(self.buffer.split_to(len)),
                None => Element::NeedMore,
            }),
        }
    }

    fn fail(&mut self, err: FirestoreError) -> Poll<Option<Result<DocumentSnapshot, FirestoreError>>> {
        self.done = true;
        Poll::Ready(Some(Err(err)))
    }
}

impl Stream for DocumentStream {
    type Item = Result<DocumentSnapshot, FirestoreError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if self.done {
                return Poll::Ready(None);
            }

            // 1. Try to decode a complete element from the buffer.
            match self.next_element() {
                Ok(Element::Object(bytes)) => {
                    let element = match serde_json::from_slice::<RunQueryResponse>(&bytes) {
                        Ok(element) => element,
                        Err(e) => return self.fail(FirestoreError::SerializationError(e)),
                    };

                    if let Some(error) = element.error {
                        return self.fail(FirestoreError::ApiError(format!(
                            "Run query failed: {}",
                            error.display_message()
                        )));
                    }
                    if let Some(rt) = element.read_time {
                        self.read_time = Some(rt);
                    }
                    if let Some(doc) = element.document {
                        let read_time = self.read_time.clone();
                        return Poll::Ready(Some(Ok(DocumentSnapshot::new(doc, read_time))));
                    }
                    continue;
                }
                Ok(Element::End) => {
                    self.done = true;
                    return Poll::Ready(None);
                }
                Ok(Element::NeedMore) => {}
                Err(e) => return self.fail(e),
            }

            // 2. Nothing complete yet, poll the body for more bytes.
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    self.buffer.extend_from_slice(&chunk);
                }
                Poll::Ready(Some(Err(e))) => {
                    return self.fail(FirestoreError::RequestError(e));
                }
                Poll::Ready(None) => {
                    return self.fail(FirestoreError::ApiError(
                        "Run query stream ended with incomplete JSON".into(),
                    ));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Finds the length of the first complete JSON object in the buffer.
fn find_json_boundary(buf: &[u8]) -> Option<usize> {
    let mut depth = 0;
    let mut in_string = false;
    let mut escape = false;
    let mut started = false;

    for (i, &b) in buf.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'{' | b'[' => {
                started = true;
                depth += 1;
            }
            b'}' | b']' if started => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b'"' if started => in_string = true,
            _ => {}
        }
    }

    None
}

pub(crate) async fn run_query_request(
    client: &ClientWithMiddleware,
    parent_path: &str,
    request: &RunQueryRequest,
) -> Result<DocumentStream, FirestoreError> {
    let url = format!("{}:runQuery", parent_path);
    debug!(%url, "running query");

    let response = client
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_vec(request)?)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FirestoreError::ApiError(
            parse_error_response(response, "Run query failed").await,
        ));
    }

    let stream = stream::unfold(response, |mut resp| async move {
        match resp.chunk().await {
            Ok(Some(bytes)) => Some((Ok(bytes), resp)),
            Ok(None) => None,
            Err(e) => Some((Err(e), resp)),
        }
    });

    Ok(DocumentStream::new(Box::pin(stream)))
}
