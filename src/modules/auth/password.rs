use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

fn hasher(cost: u32) -> Result<Argon2<'static>, argon2::password_hash::Error> {
    let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash `password` with a fresh salt; `cost` is the Argon2 iteration count.
pub fn hash(password: &str, cost: u32) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher(cost)?.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Parameters are read back from the PHC string, so hashes made under an
/// older cost still verify.
pub fn verify(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
