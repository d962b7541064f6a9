use std::fmt;

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;

use crate::error::CryptoError;
use crate::frame::{self, HEADER_LEN};
use crate::padding;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Raw length of the application key (AES-256).
pub const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const AES_BLOCK_LEN: usize = 16;

/// Encrypts and decrypts Youdu payloads for one application.
///
/// The codec holds only the derived key material and the application id. It
/// is cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct Codec {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
    app_id: String,
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("app_id", &self.app_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Codec {
    /// Build a codec from the base64 `EncodingAESKey` issued by the server.
    pub fn new(app_id: &str, encoded_key: &str) -> Result<Self, CryptoError> {
        let decoded = general_purpose::STANDARD
            .decode(encoded_key.trim())
            .map_err(CryptoError::KeyEncoding)?;
        let key: [u8; KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::KeyLength(decoded.len()))?;
        Ok(Self::from_key(app_id, key))
    }

    pub fn from_key(app_id: &str, key: [u8; KEY_LEN]) -> Self {
        let mut iv = [0_u8; IV_LEN];
        iv.copy_from_slice(&key[..IV_LEN]);
        Self {
            key,
            iv,
            app_id: app_id.trim().to_owned(),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Encrypt UTF-8 text.
    pub fn encrypt(&self, content: &str) -> Result<String, CryptoError> {
        self.encrypt_bytes(content.as_bytes())
    }

    /// Encrypt arbitrary bytes, e.g. raw file contents for media upload.
    pub fn encrypt_bytes(&self, content: &[u8]) -> Result<String, CryptoError> {
        let mut header = [0_u8; HEADER_LEN];
        rand::thread_rng().fill_bytes(&mut header);
        self.encrypt_with_header(header, content)
    }

    /// Encrypt with a caller-chosen random header. Output is fully determined
    /// by the key, the app id, `header` and `content`.
    pub fn encrypt_with_header(
        &self,
        header: [u8; HEADER_LEN],
        content: &[u8],
    ) -> Result<String, CryptoError> {
        let frame = frame::pack(header, content, self.app_id.as_bytes())?;
        let padded = padding::pad(frame);
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<NoPadding>(&padded);
        Ok(general_purpose::STANDARD.encode(ciphertext))
    }

    /// Decrypt a base64 ciphertext and return the framed content.
    ///
    /// Malformed padding is not an error: it yields empty content.
    pub fn decrypt(&self, ciphertext: &str) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = general_purpose::STANDARD
            .decode(ciphertext.trim())
            .map_err(CryptoError::Base64)?;
        self.decrypt_raw(&ciphertext)
    }

    /// Same as [`Codec::decrypt`] for ciphertext that is already base64-decoded.
    pub fn decrypt_raw(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() % AES_BLOCK_LEN != 0 {
            return Err(CryptoError::BlockSize(ciphertext.len()));
        }

        let padded = Aes256CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext)
            .map_err(|_| CryptoError::BlockSize(ciphertext.len()))?;

        let Some(frame) = padding::unpad(&padded) else {
            return Ok(Vec::new());
        };
        Ok(frame::unpack(frame)?.to_vec())
    }

    pub fn decrypt_to_str(&self, ciphertext: &str) -> Result<String, CryptoError> {
        String::from_utf8(self.decrypt(ciphertext)?).map_err(CryptoError::Utf8)
    }
}
