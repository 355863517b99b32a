use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kmbox_frame::Alphabet;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReplyOutput<'a> {
    port: &'a str,
    request: &'a str,
    reply_size: usize,
    reply: String,
}

#[derive(Serialize)]
struct AlphabetOutput<'a> {
    port: &'a str,
    alphabet: &'a str,
}

#[derive(Serialize)]
struct CodecOutput<'a> {
    operation: &'a str,
    input: &'a str,
    output: String,
    alphabet: &'a str,
}

pub fn print_reply(port: &str, request: &str, reply: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReplyOutput {
                port,
                request,
                reply_size: reply.len(),
                reply: reply_preview(reply),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "REQUEST", "SIZE", "REPLY"])
                .add_row(vec![
                    port.to_string(),
                    request.to_string(),
                    reply.len().to_string(),
                    reply_preview(reply),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "port={} request={} size={} reply={}",
                port,
                request,
                reply.len(),
                reply_preview(reply)
            );
        }
        OutputFormat::Raw => print_raw(reply),
    }
}

pub fn print_alphabet(port: &str, alphabet: &Alphabet, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&AlphabetOutput {
            port,
            alphabet: alphabet.as_str(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "ALPHABET"])
                .add_row(vec![port.to_string(), alphabet.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("port={port} alphabet={alphabet}"),
        OutputFormat::Raw => print_raw(alphabet.as_str().as_bytes()),
    }
}

pub fn print_codec(
    operation: &str,
    input: &str,
    output: &[u8],
    alphabet: &Alphabet,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => print_json(&CodecOutput {
            operation,
            input,
            output: reply_preview(output),
            alphabet: alphabet.as_str(),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPERATION", "INPUT", "OUTPUT"])
                .add_row(vec![
                    operation.to_string(),
                    input.to_string(),
                    reply_preview(output),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "{operation} input={input} output={}",
            reply_preview(output)
        ),
        OutputFormat::Raw => print_raw(output),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn reply_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_text_and_summarizes_binary() {
        assert_eq!(reply_preview(b"3.1"), "3.1");
        assert_eq!(reply_preview(&[0xff, 0xfe]), "<binary 2 bytes>");
    }

    #[test]
    fn reply_json_shape() {
        let out = ReplyOutput {
            port: "/dev/ttyACM0",
            request: "km.version()",
            reply_size: 3,
            reply: "3.1".to_string(),
        };
        let value: serde_json::Value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["reply"], "3.1");
        assert_eq!(value["reply_size"], 3);
    }
}
