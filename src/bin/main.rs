fn main() {
  ecash_wallet::main();
}
