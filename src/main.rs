use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use grpcserial::generator::error_response;
use grpcserial::{Error, Generator, GeneratorOptions, telemetry};
use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};

fn main() -> Result<()> {
    // protoc writes the request to stdin and reads the response from stdout.
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("failed to read code generator request from stdin")?;

    let response = respond(&input);

    let mut output = Vec::with_capacity(response.encoded_len());
    response
        .encode(&mut output)
        .context("failed to encode code generator response")?;
    io::stdout()
        .write_all(&output)
        .context("failed to write code generator response to stdout")?;
    Ok(())
}

fn respond(input: &[u8]) -> CodeGeneratorResponse {
    let request = match CodeGeneratorRequest::decode(input) {
        Ok(request) => request,
        Err(error) => return error_response(&Error::from(error)),
    };
    let options = match GeneratorOptions::parse(request.parameter()) {
        Ok(options) => options,
        Err(error) => return error_response(&error),
    };
    if let Err(error) = telemetry::initialise(options.log_filter()) {
        eprintln!("protoc-gen-grpcserial: {error}");
    }

    Generator::with_default_plugins(options).respond(&request)
}
