/// Text transform threaded through `get_with` / `set_with`.
///
/// The library never implements cryptography itself; callers inject whatever
/// cipher they use. `decrypt` must invert `encrypt`.
pub trait Crypto {
    fn encrypt(&self, plain: &str) -> String;
    fn decrypt(&self, cipher: &str) -> String;
}

impl<C: Crypto + ?Sized> Crypto for &C {
    fn encrypt(&self, plain: &str) -> String {
        (**self).encrypt(plain)
    }

    fn decrypt(&self, cipher: &str) -> String {
        (**self).decrypt(cipher)
    }
}
