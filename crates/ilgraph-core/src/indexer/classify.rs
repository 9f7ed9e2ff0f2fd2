//! Instruction classification for usage and call analysis.

use crate::models::{Instruction, MemberRef, MethodDef, OpCode, Operand};

/// The semantic action an instruction performs, as far as analysis cares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action<'a> {
    Invoke(&'a MemberRef),
    ReadField(&'a MemberRef),
    WriteField(&'a MemberRef),
    Other,
}

/// Map an instruction to its [`Action`].
///
/// Opcode and operand must agree: a call opcode with a field operand (or no
/// operand at all) is `Other`.
pub fn classify(instruction: &Instruction) -> Action<'_> {
    match (&instruction.opcode, &instruction.operand) {
        (OpCode::Call | OpCode::CallVirt, Some(Operand::Method(target))) => Action::Invoke(target),
        (OpCode::LoadField | OpCode::LoadStaticField, Some(Operand::Field(target))) => {
            Action::ReadField(target)
        }
        (OpCode::StoreField | OpCode::StoreStaticField, Some(Operand::Field(target))) => {
            Action::WriteField(target)
        }
        _ => Action::Other,
    }
}

/// Every invoked member in a method body, in instruction order, with the IL
/// offset when known. Bodiless methods yield nothing.
pub fn invocations(method: &MethodDef) -> Vec<(&MemberRef, Option<u32>)> {
    method
        .instructions
        .iter()
        .flatten()
        .filter_map(|ins| match classify(ins) {
            Action::Invoke(target) => Some((target, ins.offset)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TypeSig;

    #[test]
    fn calls_are_invokes() {
        let call = Instruction::call("A", "Run");
        let virt = Instruction::callvirt("A", "Run");
        assert_eq!(classify(&call), Action::Invoke(&MemberRef::new("A", "Run")));
        assert_eq!(classify(&virt), Action::Invoke(&MemberRef::new("A", "Run")));
    }

    #[test]
    fn field_access_kinds() {
        let target = MemberRef::new("A", "count");
        assert_eq!(classify(&Instruction::ldfld("A", "count")), Action::ReadField(&target));
        assert_eq!(classify(&Instruction::ldsfld("A", "count")), Action::ReadField(&target));
        assert_eq!(classify(&Instruction::stfld("A", "count")), Action::WriteField(&target));
        assert_eq!(classify(&Instruction::stsfld("A", "count")), Action::WriteField(&target));
    }

    #[test]
    fn mismatched_or_missing_operand_is_other() {
        let unresolved = Instruction::new(OpCode::Call, None);
        assert_eq!(classify(&unresolved), Action::Other);

        let wrong = Instruction::new(
            OpCode::LoadField,
            Some(Operand::Method(MemberRef::new("A", "Run"))),
        );
        assert_eq!(classify(&wrong), Action::Other);

        let typed = Instruction::new(OpCode::Call, Some(Operand::Type(TypeSig::new("A"))));
        assert_eq!(classify(&typed), Action::Other);
        assert_eq!(classify(&Instruction::other("nop")), Action::Other);
    }

    #[test]
    fn invocations_skip_bodiless_methods() {
        assert!(invocations(&MethodDef::new("Abstract")).is_empty());
        let method = MethodDef::new("Run").body(vec![
            Instruction::call("A", "One").at(0),
            Instruction::ldfld("A", "x").at(5),
            Instruction::callvirt("A", "Two").at(10),
        ]);
        let calls: Vec<(String, Option<u32>)> = invocations(&method)
            .into_iter()
            .map(|(m, off)| (m.full_name(), off))
            .collect();
        assert_eq!(
            calls,
            vec![("A.One".to_string(), Some(0)), ("A.Two".to_string(), Some(10))]
        );
    }
}
