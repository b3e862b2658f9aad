//! Format output dispatch helpers

/// Dispatch on the output format when the JSON branch returns a `Result`
/// and the human branch only prints.
///
/// ```rust,ignore
/// output_by_format_result!(cli.format,
///     json => {
///         println!("{}", serde_json::to_string_pretty(&data)?);
///         Ok::<(), StoreError>(())
///     },
///     human => { println!("Done"); }
/// )?;
/// ```
#[macro_export]
macro_rules! output_by_format_result {
    ($format:expr, json => $json:expr, human => $human:block) => {
        match $format {
            ::notestore_core::format::OutputFormat::Json => $json,
            ::notestore_core::format::OutputFormat::Human => {
                $human;
                Ok(())
            }
        }
    };
}
