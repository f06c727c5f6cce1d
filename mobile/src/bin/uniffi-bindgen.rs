// Kotlin / Swift binding generator, run in library mode against the built cdylib:
//   cargo run -p imageflow-mobile --bin uniffi-bindgen -- generate \
//     --library target/release/libimageflow_mobile.so --language kotlin --out-dir out

fn main() {
    uniffi::uniffi_bindgen_main()
}
