pub fn stable_field_id(form_id: &str, field_name: &str) -> String {
    let seed = format!("{form_id}::{field_name}");
    format!("{field_name}-{:016x}", fnv1a64(seed.as_bytes()))
}

pub fn error_slot_id(field_id: &str) -> String {
    format!("{field_id}-error")
}

fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x00000100000001b3;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_stable_for_same_form_and_field() {
        let ids = (0..3)
            .map(|_| stable_field_id("product-form", "price"))
            .collect::<Vec<_>>();
        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn id_differs_across_fields_and_forms() {
        let price = stable_field_id("product-form", "price");
        let code = stable_field_id("product-form", "productCode");
        let other_form = stable_field_id("contact-form", "price");
        assert_ne!(price, code);
        assert_ne!(price, other_form);
    }

    #[test]
    fn slot_id_derives_from_field_id() {
        let field_id = stable_field_id("product-form", "price");
        assert_eq!(error_slot_id(&field_id), format!("{field_id}-error"));
    }
}
