//! Guards the opcode table against accidental changes to tags or record layout.
//!
//! Programs are plain byte streams with no version header, so any edit to a
//! tag, a mnemonic, an operand shape or the record size silently changes the
//! meaning of existing programs. Update `EXPECTED_ISA_HASH` only on purpose.

#[cfg(test)]
mod tests {
    use crate::virtual_machine::instruction::INSTRUCTION_SIZE;

    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    const EXPECTED_ISA_HASH: u64 = 12977869732256436675;

    fn fnv1a64(mut h: u64, bytes: &[u8]) -> u64 {
        for b in bytes {
            h ^= *b as u64;
            h = h.wrapping_mul(FNV_PRIME);
        }
        h
    }

    macro_rules! hash_isa {
        (
            $( $(#[$doc:meta])* $name:ident = $tag:literal, $mnemonic:literal => [ $( $field:ident ),* $(,)? ], $executable:literal ),* $(,)?
        ) => {{
            let mut h = FNV_OFFSET;
            $(
                h = fnv1a64(h, stringify!($name).as_bytes());
                h = fnv1a64(h, &(crate::virtual_machine::isa::Opcode::$name as u32).to_le_bytes());
                h = fnv1a64(h, $mnemonic.as_bytes());
                $( h = fnv1a64(h, stringify!($field).as_bytes()); )*
                h = fnv1a64(h, &[$executable as u8]);
            )*
            h = fnv1a64(h, &(INSTRUCTION_SIZE as u32).to_le_bytes());
            h
        }};
    }

    fn current_isa_hash() -> u64 {
        crate::for_each_opcode!(hash_isa)
    }

    #[test]
    #[ignore]
    fn print_isa_hash() {
        println!("ISA_HASH={}", current_isa_hash());
    }

    #[test]
    fn isa_hash_unchanged() {
        assert_eq!(current_isa_hash(), EXPECTED_ISA_HASH);
    }
}
