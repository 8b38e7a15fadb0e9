//! CPF (Brazilian individual taxpayer number) validation.
//!
//! This is the authoritative, server-side check that gates payment creation.
//! Client-side mask/format validation is display-only and not trusted.

/// Validate a CPF by its two check digits.
///
/// Accepts any string; non-digit characters (dots, dashes, spaces) are
/// stripped before checking. Rejects anything that is not exactly 11 digits
/// or that is a repeated single digit (`"11111111111"` passes the checksum
/// but is not a valid CPF).
pub fn is_valid_cpf(input: &str) -> bool {
    let digits: Vec<u32> = input.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 {
        return false;
    }
    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9], 10) == digits[9] && check_digit(&digits[..10], 11) == digits[10]
}

/// Weighted-sum-mod-11 check digit: weights descend from `start_weight` to 2.
fn check_digit(digits: &[u32], start_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .zip((2..=start_weight).rev())
        .map(|(d, w)| d * w)
        .sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_cpfs() {
        assert!(is_valid_cpf("11144477735"));
        assert!(is_valid_cpf("52998224725"));
    }

    #[test]
    fn test_formatted_input_is_accepted() {
        assert!(is_valid_cpf("111.444.777-35"));
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf(" 111 444 777 35 "));
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("1114447773"));
        assert!(!is_valid_cpf("111444777355"));
    }

    #[test]
    fn test_repeated_digits_rejected() {
        // These satisfy the checksum arithmetic but are not valid CPFs
        for d in 0..=9 {
            let cpf: String = std::iter::repeat(char::from_digit(d, 10).unwrap())
                .take(11)
                .collect();
            assert!(!is_valid_cpf(&cpf), "repeated digit CPF {} should fail", cpf);
        }
    }

    #[test]
    fn test_single_digit_mutations_rejected() {
        let valid = "11144477735";
        for pos in 0..11 {
            for d in 0..=9u32 {
                let original = valid.as_bytes()[pos] - b'0';
                if d == original as u32 {
                    continue;
                }
                let mut mutated = valid.to_string().into_bytes();
                mutated[pos] = b'0' + d as u8;
                let mutated = String::from_utf8(mutated).unwrap();
                assert!(
                    !is_valid_cpf(&mutated),
                    "mutation {} of valid CPF should fail",
                    mutated
                );
            }
        }
    }

    #[test]
    fn test_non_digit_garbage_rejected() {
        assert!(!is_valid_cpf("abcdefghijk"));
        assert!(!is_valid_cpf("111444777ab"));
    }
}
