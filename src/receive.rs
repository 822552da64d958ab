//! The per-connection receive loop: pulls frames from the codec, reassembles
//! fragmented application messages, answers pings, and dispatches finished
//! messages to the user handler. Terminates on a close frame, malformed
//! input, or I/O failure — in every case by asking the [`Manager`] to remove
//! the connection, which in turn closes it.

use crate::codec;
use crate::config::WebSocketConfig;
use crate::connection::{BoxedReader, Connection};
use crate::frame::OpCode;
use crate::manager::Manager;
use crate::message::{BinaryMessage, CloseMessage, TextMessage};
use std::sync::Arc;

struct FragmentedMessage {
    is_text: bool,
    buffer: Vec<u8>,
}

enum Outcome {
    Continue,
    Terminate,
}

pub(crate) async fn run(
    connection: Arc<Connection>,
    mut input: BoxedReader,
    config: WebSocketConfig,
    manager: Arc<Manager>,
) {
    let mut fragmented: Option<FragmentedMessage> = None;

    loop {
        let frame = match codec::read_frame(&mut input, config.max_frame_size).await {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("connection {}: receive loop error: {err}", connection.id());
                break;
            }
        };

        let outcome = match frame.opcode {
            OpCode::Close => {
                handle_close(&connection, frame.payload).await;
                Outcome::Terminate
            }
            OpCode::Ping => {
                if let Err(err) = connection.send_pong(&frame.payload).await {
                    log::error!("connection {}: failed to send pong: {err}", connection.id());
                    Outcome::Terminate
                } else {
                    Outcome::Continue
                }
            }
            OpCode::Pong => Outcome::Continue,
            OpCode::Text | OpCode::Binary if fragmented.is_none() => {
                if frame.final_fragment {
                    dispatch(&connection, frame.opcode == OpCode::Text, frame.payload).await
                } else {
                    fragmented = Some(FragmentedMessage {
                        is_text: frame.opcode == OpCode::Text,
                        buffer: frame.payload,
                    });
                    Outcome::Continue
                }
            }
            OpCode::Text | OpCode::Binary => {
                log::error!(
                    "connection {}: text/binary frame received mid-fragmentation",
                    connection.id()
                );
                Outcome::Terminate
            }
            OpCode::Continuation => match fragmented.take() {
                None => {
                    log::warn!(
                        "connection {}: continuation frame with no message in progress, discarding",
                        connection.id()
                    );
                    Outcome::Continue
                }
                Some(mut in_progress) => {
                    in_progress.buffer.extend_from_slice(&frame.payload);

                    if in_progress.buffer.len() > config.max_message_size {
                        log::error!(
                            "connection {}: reassembled message exceeds max_message_size",
                            connection.id()
                        );
                        Outcome::Terminate
                    } else if frame.final_fragment {
                        dispatch(&connection, in_progress.is_text, in_progress.buffer).await
                    } else {
                        fragmented = Some(in_progress);
                        Outcome::Continue
                    }
                }
            },
        };

        if matches!(outcome, Outcome::Terminate) {
            break;
        }
    }

    manager.remove(connection.id()).await;
}

async fn dispatch(connection: &Arc<Connection>, is_text: bool, payload: Vec<u8>) -> Outcome {
    if is_text {
        match String::from_utf8(payload) {
            Ok(text) => {
                connection
                    .handler()
                    .on_text_message(TextMessage {
                        connection: Arc::clone(connection),
                        text,
                    })
                    .await;
                Outcome::Continue
            }
            Err(err) => {
                log::error!(
                    "connection {}: text frame was not valid UTF-8: {err}",
                    connection.id()
                );
                Outcome::Terminate
            }
        }
    } else {
        connection
            .handler()
            .on_binary_message(BinaryMessage {
                connection: Arc::clone(connection),
                data: payload,
            })
            .await;
        Outcome::Continue
    }
}

async fn handle_close(connection: &Arc<Connection>, payload: Vec<u8>) {
    let (code, reason) = parse_close_payload(payload);
    connection
        .handler()
        .on_close_message(CloseMessage {
            connection: Arc::clone(connection),
            code,
            reason,
        })
        .await;
}

fn parse_close_payload(payload: Vec<u8>) -> (crate::close_code::CloseCode, Option<String>) {
    if payload.len() < 2 {
        return (crate::close_code::CloseCode::NoCode, None);
    }

    let code = u16::from_be_bytes([payload[0], payload[1]]).into();
    let reason = String::from_utf8(payload[2..].to_vec()).ok().filter(|s| !s.is_empty());
    (code, reason)
}
