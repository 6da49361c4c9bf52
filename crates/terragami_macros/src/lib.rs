use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, ItemFn, LitInt};

/// Time a compile-pipeline function when the `perf_stats` feature is enabled.
///
/// The generated guard measures wall time from function entry to the moment the
/// function returns (including early returns and `?` propagation). Runs slower
/// than the threshold are reported at info level as `[PERF]`, faster ones at
/// debug level so they stay out of normal logs.
///
/// # Example
/// ```ignore
/// #[profile(5)] // report at info level above 5ms
/// pub fn compile_snapshot(&mut self, store: &Store) -> Arc<TerrainSnapshot> {
///     // ... work ...
/// }
/// ```
///
/// Without an argument the threshold is 1ms. With `perf_stats` disabled the
/// function body is emitted unchanged.
#[proc_macro_attribute]
pub fn profile(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let threshold_ms: u128 = if attr.is_empty() {
        1
    } else {
        let literal = parse_macro_input!(attr as LitInt);
        match literal.base10_parse::<u128>() {
            Ok(ms) => ms,
            Err(err) => return err.to_compile_error().into(),
        }
    };

    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name_str = sig.ident.to_string();

    let output = quote! {
        #(#attrs)*
        #vis #sig {
            #[cfg(feature = "perf_stats")]
            let _profile_timer = {
                struct TerragamiProfileGuard {
                    name: &'static str,
                    start: std::time::Instant,
                }
                impl Drop for TerragamiProfileGuard {
                    fn drop(&mut self) {
                        let elapsed = self.start.elapsed();
                        if elapsed.as_millis() > #threshold_ms {
                            bevy::log::info!("[PERF] {}: {:?}", self.name, elapsed);
                        } else {
                            bevy::log::debug!("[PERF] {}: {:?}", self.name, elapsed);
                        }
                    }
                }
                TerragamiProfileGuard {
                    name: #fn_name_str,
                    start: std::time::Instant::now(),
                }
            };

            #block
        }
    };

    output.into()
}
