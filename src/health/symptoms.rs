use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymptomOrientation {
    pub id: &'static str,
    pub title: &'static str,
    pub tip: &'static str,
}

const ORIENTATIONS: &[SymptomOrientation] = &[
    SymptomOrientation {
        id: "falta-energia",
        title: "Falta de Energia",
        tip: "A fadiga pode estar relacionada à qualidade do sono, níveis de ferro ou disfunção tireoidiana. Uma avaliação metabólica pode identificar a causa.",
    },
    SymptomOrientation {
        id: "dor-articular",
        title: "Dor Articular",
        tip: "O excesso de peso aumenta a carga nas articulações. A perda de peso alivia significativamente dores em joelhos e quadris.",
    },
    SymptomOrientation {
        id: "inchaco",
        title: "Inchaço",
        tip: "Pode indicar retenção hídrica, sensibilidade alimentar ou desequilíbrio hormonal. Ajustes na alimentação costumam trazer alívio rápido.",
    },
    SymptomOrientation {
        id: "constipacao",
        title: "Constipação",
        tip: "Relacionada à hidratação, fibras e saúde intestinal. Uma dieta balanceada melhora significativamente o trânsito intestinal.",
    },
    SymptomOrientation {
        id: "acne",
        title: "Acne",
        tip: "Frequentemente ligada a resistência insulínica e desequilíbrios hormonais. Mudanças na alimentação podem melhorar a pele.",
    },
    SymptomOrientation {
        id: "tpm-intensa",
        title: "TPM Intensa",
        tip: "Os sintomas pré-menstruais podem ser amenizados com equilíbrio hormonal, controle de estresse e nutrição adequada.",
    },
    SymptomOrientation {
        id: "ciclo-desregulado",
        title: "Ciclo Menstrual Desregulado",
        tip: "Irregularidades podem indicar síndrome dos ovários policísticos ou disfunção tireoidiana. Avaliação médica é recomendada.",
    },
    SymptomOrientation {
        id: "oscilacao-humor",
        title: "Oscilação de Humor",
        tip: "Mudanças de humor podem estar relacionadas a flutuações hormonais, resistência à insulina ou deficiências nutricionais. Equilibrar a alimentação e o sono ajuda a estabilizar o humor.",
    },
];

/// Lookup from symptom id to its orientation text.
///
/// Held in `AppState` so tests and alternative deployments can swap the table.
#[derive(Debug, Clone, Copy)]
pub struct SymptomGuide {
    entries: &'static [SymptomOrientation],
}

impl SymptomGuide {
    pub const fn new(entries: &'static [SymptomOrientation]) -> Self {
        Self { entries }
    }

    pub const fn standard() -> Self {
        Self::new(ORIENTATIONS)
    }

    pub fn get(&self, id: &str) -> Option<&'static SymptomOrientation> {
        self.entries.iter().find(|o| o.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|o| o.id)
    }
}

impl Default for SymptomGuide {
    fn default() -> Self {
        Self::standard()
    }
}
